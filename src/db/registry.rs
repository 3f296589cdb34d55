use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use duckdb::types::ValueRef;
use r2d2::Pool;
use tracing::debug;

use crate::db::db_pool::DuckDBConnectionManager;
use crate::eval::exec::{CellValue, ExecutionError, QueryExecutor, Row, RowSet};

/// Lazily opened, pooled read-only connections to the benchmark
/// databases, keyed by `db_id`. Database files live either at
/// `<dir>/<db_id>/<db_id>.duckdb` or flat at `<dir>/<db_id>.duckdb`.
pub struct DatabaseRegistry {
    database_dir: PathBuf,
    pool_size: u32,
    pools: Mutex<HashMap<String, Pool<DuckDBConnectionManager>>>,
}

impl DatabaseRegistry {
    pub fn new(database_dir: PathBuf, pool_size: u32) -> Self {
        Self {
            database_dir,
            pool_size,
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn database_path(&self, db_id: &str) -> Option<PathBuf> {
        // db_id comes from user-supplied JSON; never let it walk paths.
        if db_id.is_empty() || db_id.contains(['/', '\\']) || db_id.contains("..") {
            return None;
        }
        let nested = self
            .database_dir
            .join(db_id)
            .join(format!("{}.duckdb", db_id));
        if nested.is_file() {
            return Some(nested);
        }
        let flat = self.database_dir.join(format!("{}.duckdb", db_id));
        flat.is_file().then_some(flat)
    }

    fn pool(&self, db_id: &str) -> Result<Pool<DuckDBConnectionManager>, ExecutionError> {
        let mut pools = self.pools.lock().unwrap();
        if let Some(pool) = pools.get(db_id) {
            return Ok(pool.clone());
        }
        let path = self.database_path(db_id).ok_or_else(|| {
            ExecutionError::Engine(format!("no database file for {:?}", db_id))
        })?;
        debug!(db_id, path = %path.display(), "opening database pool");
        let manager = DuckDBConnectionManager::new_read_only(path_string(&path));
        let pool = Pool::builder()
            .max_size(self.pool_size)
            .build(manager)
            .map_err(|e| ExecutionError::Engine(e.to_string()))?;
        pools.insert(db_id.to_string(), pool.clone());
        Ok(pool)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl QueryExecutor for DatabaseRegistry {
    fn execute(&self, db_id: &str, sql: &str, max_rows: usize) -> Result<RowSet, ExecutionError> {
        let pool = self.pool(db_id)?;
        let conn = pool
            .get()
            .map_err(|e| ExecutionError::Engine(e.to_string()))?;
        fetch_rows(&conn, sql, max_rows)
    }
}

/// Runs one query on a connection and collects the full result set,
/// enforcing the row ceiling.
fn fetch_rows(
    conn: &duckdb::Connection,
    sql: &str,
    max_rows: usize,
) -> Result<RowSet, ExecutionError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ExecutionError::Engine(e.to_string()))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| ExecutionError::Engine(e.to_string()))?;

    // The statement knows its width even for an empty result.
    let column_count = rows.as_ref().map_or(0, |s| s.column_count());
    let mut out: Vec<Row> = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| ExecutionError::Engine(e.to_string()))?
    {
        if out.len() >= max_rows {
            return Err(ExecutionError::ResourceExceeded);
        }
        let mut cells = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value = row
                .get_ref(i)
                .map_err(|e| ExecutionError::Engine(e.to_string()))?;
            cells.push(convert(value));
        }
        out.push(cells);
    }
    Ok(RowSet {
        column_count,
        rows: out,
    })
}

fn convert(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Boolean(b) => CellValue::Bool(b),
        ValueRef::TinyInt(i) => CellValue::Int(i as i64),
        ValueRef::SmallInt(i) => CellValue::Int(i as i64),
        ValueRef::Int(i) => CellValue::Int(i as i64),
        ValueRef::BigInt(i) => CellValue::Int(i),
        ValueRef::UTinyInt(i) => CellValue::Int(i as i64),
        ValueRef::USmallInt(i) => CellValue::Int(i as i64),
        ValueRef::UInt(i) => CellValue::Int(i as i64),
        ValueRef::UBigInt(i) => CellValue::Float(i as f64),
        ValueRef::Float(f) => CellValue::Float(f as f64),
        ValueRef::Double(f) => CellValue::Float(f),
        ValueRef::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => CellValue::Float(f),
            Err(_) => CellValue::Text(d.to_string()),
        },
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
        // Temporal and nested values compare by their debug rendering,
        // which is stable across the two sides of a comparison.
        other => CellValue::Text(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::exec::{rows_equivalent, ColumnOrderPolicy};
    use duckdb::Connection;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE singer (singer_id INTEGER, name VARCHAR, age INTEGER);
             INSERT INTO singer VALUES (1, 'Joe', 52), (2, 'Ann', 19), (3, 'Tim', 31);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn fetches_typed_rows() {
        let conn = seeded_connection();
        let rows = fetch_rows(&conn, "SELECT name, age FROM singer ORDER BY age", 100).unwrap();
        assert_eq!(rows.column_count, 2);
        assert_eq!(
            rows.rows[0],
            vec![CellValue::Text("Ann".into()), CellValue::Int(19)]
        );
        assert_eq!(rows.rows.len(), 3);
    }

    #[test]
    fn null_and_float_cells_convert() {
        let conn = seeded_connection();
        let rows = fetch_rows(&conn, "SELECT NULL, AVG(age) FROM singer", 100).unwrap();
        assert_eq!(rows.rows[0][0], CellValue::Null);
        assert!(matches!(rows.rows[0][1], CellValue::Float(_)));
    }

    #[test]
    fn row_ceiling_is_enforced() {
        let conn = seeded_connection();
        let err = fetch_rows(&conn, "SELECT * FROM singer", 2).unwrap_err();
        assert_eq!(err, ExecutionError::ResourceExceeded);
    }

    #[test]
    fn bad_sql_is_an_engine_error() {
        let conn = seeded_connection();
        assert!(matches!(
            fetch_rows(&conn, "SELECT nope FROM nothing", 100),
            Err(ExecutionError::Engine(_))
        ));
    }

    #[test]
    fn equivalent_queries_produce_equal_result_sets() {
        let conn = seeded_connection();
        let gold = fetch_rows(&conn, "SELECT name FROM singer WHERE age > 20", 100).unwrap();
        let pred = fetch_rows(
            &conn,
            "SELECT T1.name FROM singer AS T1 WHERE T1.age > 20.0",
            100,
        )
        .unwrap();
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn empty_results_keep_their_column_count() {
        let conn = seeded_connection();
        let one = fetch_rows(&conn, "SELECT name FROM singer WHERE age > 99", 100).unwrap();
        let two = fetch_rows(&conn, "SELECT name, age FROM singer WHERE age > 99", 100).unwrap();
        assert_eq!(one.column_count, 1);
        assert_eq!(two.column_count, 2);
        assert!(!rows_equivalent(&one, &two, false, ColumnOrderPolicy::AnyPermutation));
    }

    #[test]
    fn rejects_path_traversal_in_db_id() {
        let registry = DatabaseRegistry::new(PathBuf::from("/tmp/dbs"), 2);
        assert_eq!(registry.database_path("../etc"), None);
        assert_eq!(registry.database_path("a/b"), None);
        assert_eq!(registry.database_path(""), None);
    }

    #[test]
    fn missing_database_is_an_engine_error() {
        let registry = DatabaseRegistry::new(PathBuf::from("/nonexistent"), 2);
        let err = registry.execute("concert_singer", "SELECT 1", 10).unwrap_err();
        assert!(matches!(err, ExecutionError::Engine(_)));
    }
}
