//! Execution accuracy: run predicted and gold SQL against the same
//! database and compare the result sets.
//!
//! The engine is an opaque `QueryExecutor` capability. Every call runs
//! on the blocking pool under a deadline and a row ceiling; a predicted
//! query that times out, errors, or blows the ceiling is an execution
//! mismatch, never a harness failure. Gold-side failures propagate,
//! since gold is trusted benchmark data.

use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

/// Result-column permutation checks are skipped beyond this width and
/// only positional alignment is tried.
const MAX_PERMUTATION_COLUMNS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    Timeout,
    Engine(String),
    ResourceExceeded,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Timeout => write!(f, "query timed out"),
            ExecutionError::Engine(msg) => write!(f, "engine error: {}", msg),
            ExecutionError::ResourceExceeded => write!(f, "result exceeded the row ceiling"),
        }
    }
}

impl Error for ExecutionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

pub type Row = Vec<CellValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub column_count: usize,
    pub rows: Vec<Row>,
}

/// Opaque query-execution capability: `execute(sql, db) -> rows | error`.
/// Implementations must use a connection private to the call.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, db_id: &str, sql: &str, max_rows: usize) -> Result<RowSet, ExecutionError>;
}

/// Whether a prediction whose result columns are a permutation of
/// gold's still counts as equal. Permutation tolerance is the pinned
/// default; exact positional alignment is available for benchmarks that
/// require it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrderPolicy {
    AnyPermutation,
    Exact,
}

impl FromStr for ColumnOrderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-permutation" => Ok(ColumnOrderPolicy::AnyPermutation),
            "exact" => Ok(ColumnOrderPolicy::Exact),
            other => Err(format!(
                "unknown column order policy {:?} (expected \"any-permutation\" or \"exact\")",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub timeout: Duration,
    pub max_rows: usize,
    pub column_order: ColumnOrderPolicy,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_rows: 100_000,
            column_order: ColumnOrderPolicy::AnyPermutation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecVerdict {
    pub matched: bool,
    /// The predicted query's failure, when it had one.
    pub pred_error: Option<ExecutionError>,
}

/// Runs both queries and compares their results. `gold_ordered` selects
/// sequence comparison (gold has ORDER BY) over multiset comparison.
/// Gold-side errors propagate; predicted-side errors become a mismatch.
pub async fn verify(
    executor: &Arc<dyn QueryExecutor>,
    db_id: &str,
    pred_sql: &str,
    gold_sql: &str,
    gold_ordered: bool,
    opts: &ExecOptions,
) -> Result<ExecVerdict, ExecutionError> {
    let gold = run_query(executor, db_id, gold_sql, opts).await?;
    let pred = match run_query(executor, db_id, pred_sql, opts).await {
        Ok(rows) => rows,
        Err(err) => {
            debug!(db_id, %err, "predicted query failed to execute");
            return Ok(ExecVerdict {
                matched: false,
                pred_error: Some(err),
            });
        }
    };
    Ok(ExecVerdict {
        matched: rows_equivalent(&pred, &gold, gold_ordered, opts.column_order),
        pred_error: None,
    })
}

/// Executes one query on the blocking pool under the deadline. On
/// timeout the blocking task is abandoned; it releases its connection
/// when the engine call finally returns.
async fn run_query(
    executor: &Arc<dyn QueryExecutor>,
    db_id: &str,
    sql: &str,
    opts: &ExecOptions,
) -> Result<RowSet, ExecutionError> {
    let executor = Arc::clone(executor);
    let db_id = db_id.to_string();
    let sql = sql.to_string();
    let max_rows = opts.max_rows;
    let task = tokio::task::spawn_blocking(move || executor.execute(&db_id, &sql, max_rows));
    match timeout(opts.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ExecutionError::Engine(join_err.to_string())),
        Err(_) => Err(ExecutionError::Timeout),
    }
}

/// Canonical, totally ordered form of one cell. Integers render as
/// exact decimals; fractional floats round to six significant decimals,
/// giving only float cells the tolerance. An integral float shares the
/// integer rendering, so COUNT-as-int equals COUNT-as-double.
fn cell_key(cell: &CellValue) -> (u8, String) {
    match cell {
        CellValue::Null => (0, String::new()),
        CellValue::Bool(b) => (1, b.to_string()),
        CellValue::Int(i) => (2, i.to_string()),
        CellValue::Float(f) => (2, num_key(*f)),
        CellValue::Text(s) => (3, s.clone()),
        CellValue::Blob(b) => (4, format!("{:02x?}", b)),
    }
}

fn num_key(value: f64) -> String {
    // Collapse -0.0 into 0.0 before formatting.
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return (value as i64).to_string();
    }
    format!("{:.6e}", value)
}

/// Compares two result sets. Counts must agree; rows compare as a
/// sequence when `ordered`, else as a multiset via a canonical sort.
pub fn rows_equivalent(
    pred: &RowSet,
    gold: &RowSet,
    ordered: bool,
    policy: ColumnOrderPolicy,
) -> bool {
    if pred.column_count != gold.column_count || pred.rows.len() != gold.rows.len() {
        return false;
    }
    let n = gold.column_count;
    if n == 0 || gold.rows.is_empty() {
        return true;
    }
    let identity: Vec<usize> = (0..n).collect();
    if rows_match(pred, gold, &identity, ordered) {
        return true;
    }
    if policy == ColumnOrderPolicy::Exact || n > MAX_PERMUTATION_COLUMNS {
        return false;
    }
    permutation_matches(pred, gold, ordered)
}

/// Projects pred's columns through `perm` (gold position -> pred
/// column) and compares canonical rows.
fn rows_match(pred: &RowSet, gold: &RowSet, perm: &[usize], ordered: bool) -> bool {
    let n = gold.column_count;
    let mut pred_rows: Vec<Vec<(u8, String)>> = pred
        .rows
        .iter()
        .map(|row| perm.iter().map(|&j| cell_key(&row[j])).collect())
        .collect();
    let mut gold_rows: Vec<Vec<(u8, String)>> = gold
        .rows
        .iter()
        .map(|row| (0..n).map(|i| cell_key(&row[i])).collect())
        .collect();
    if !ordered {
        pred_rows.sort();
        gold_rows.sort();
    }
    pred_rows == gold_rows
}

/// Searches for a column permutation that makes the result sets equal.
/// Candidates are pruned by per-column canonical content before the
/// full row comparison runs.
fn permutation_matches(pred: &RowSet, gold: &RowSet, ordered: bool) -> bool {
    let n = gold.column_count;
    let column_key = |rs: &RowSet, col: usize| -> Vec<(u8, String)> {
        let mut keys: Vec<(u8, String)> =
            rs.rows.iter().map(|row| cell_key(&row[col])).collect();
        if !ordered {
            keys.sort();
        }
        keys
    };
    let pred_cols: Vec<_> = (0..n).map(|j| column_key(pred, j)).collect();
    let gold_cols: Vec<_> = (0..n).map(|g| column_key(gold, g)).collect();
    let candidates: Vec<Vec<usize>> = (0..n)
        .map(|g| (0..n).filter(|&j| pred_cols[j] == gold_cols[g]).collect())
        .collect();
    if candidates.iter().any(|c| c.is_empty()) {
        return false;
    }
    let mut used = vec![false; n];
    let mut perm = Vec::with_capacity(n);
    assign(pred, gold, ordered, &candidates, &mut used, &mut perm)
}

fn assign(
    pred: &RowSet,
    gold: &RowSet,
    ordered: bool,
    candidates: &[Vec<usize>],
    used: &mut Vec<bool>,
    perm: &mut Vec<usize>,
) -> bool {
    let g = perm.len();
    if g == candidates.len() {
        return rows_match(pred, gold, perm, ordered);
    }
    for &j in &candidates[g] {
        if used[j] {
            continue;
        }
        used[j] = true;
        perm.push(j);
        if assign(pred, gold, ordered, candidates, used, perm) {
            return true;
        }
        perm.pop();
        used[j] = false;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rowset(rows: Vec<Row>) -> RowSet {
        let column_count = rows.first().map(|r| r.len()).unwrap_or(0);
        RowSet { column_count, rows }
    }

    fn int_text(i: i64, s: &str) -> Row {
        vec![CellValue::Int(i), CellValue::Text(s.to_string())]
    }

    #[test]
    fn multiset_comparison_ignores_row_order() {
        let gold = rowset(vec![int_text(1, "a"), int_text(2, "b")]);
        let pred = rowset(vec![int_text(2, "b"), int_text(1, "a")]);
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn sequence_comparison_respects_row_order() {
        let gold = rowset(vec![int_text(1, "a"), int_text(2, "b")]);
        let pred = rowset(vec![int_text(2, "b"), int_text(1, "a")]);
        assert!(!rows_equivalent(&pred, &gold, true, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn permuted_columns_match_under_the_default_policy() {
        let gold = rowset(vec![int_text(1, "a"), int_text(2, "b")]);
        let pred = rowset(vec![
            vec![CellValue::Text("a".into()), CellValue::Int(1)],
            vec![CellValue::Text("b".into()), CellValue::Int(2)],
        ]);
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::AnyPermutation));
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn permutation_must_keep_rows_coherent() {
        // Both columns hold the same value multiset, but no permutation
        // reproduces gold's row pairing.
        let gold = rowset(vec![
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec![CellValue::Int(2), CellValue::Int(1)],
        ]);
        let pred = rowset(vec![
            vec![CellValue::Int(1), CellValue::Int(1)],
            vec![CellValue::Int(2), CellValue::Int(2)],
        ]);
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::AnyPermutation));
    }

    #[test]
    fn floats_compare_with_tolerance_and_against_ints() {
        let gold = rowset(vec![vec![CellValue::Float(2.0)]]);
        let pred = rowset(vec![vec![CellValue::Int(2)]]);
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));

        let gold = rowset(vec![vec![CellValue::Float(0.3)]]);
        let pred = rowset(vec![vec![CellValue::Float(0.1 + 0.2)]]);
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn integers_compare_exactly() {
        let gold = rowset(vec![vec![CellValue::Int(12_345_678)]]);
        let pred = rowset(vec![vec![CellValue::Int(12_345_679)]]);
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));

        // Large counts stay exact past the six-digit float rounding.
        let gold = rowset(vec![vec![CellValue::Int(9_007_199_254_740_993)]]);
        let pred = rowset(vec![vec![CellValue::Int(9_007_199_254_740_992)]]);
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));

        let gold = rowset(vec![vec![CellValue::Int(12_345_678)]]);
        let pred = rowset(vec![vec![CellValue::Float(12_345_678.0)]]);
        assert!(rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::Exact));
    }

    #[test]
    fn differing_shapes_never_match() {
        let gold = rowset(vec![int_text(1, "a")]);
        let pred = rowset(vec![vec![CellValue::Int(1)]]);
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::AnyPermutation));
        let pred = rowset(vec![int_text(1, "a"), int_text(1, "a")]);
        assert!(!rows_equivalent(&pred, &gold, false, ColumnOrderPolicy::AnyPermutation));
    }

    #[test]
    fn null_is_distinct_from_zero_and_empty_string() {
        let gold = rowset(vec![vec![CellValue::Null]]);
        assert!(!rows_equivalent(
            &rowset(vec![vec![CellValue::Int(0)]]),
            &gold,
            false,
            ColumnOrderPolicy::Exact
        ));
        assert!(!rows_equivalent(
            &rowset(vec![vec![CellValue::Text(String::new())]]),
            &gold,
            false,
            ColumnOrderPolicy::Exact
        ));
    }

    #[test]
    fn column_order_policy_parses() {
        assert_eq!(
            "any-permutation".parse::<ColumnOrderPolicy>().unwrap(),
            ColumnOrderPolicy::AnyPermutation
        );
        assert_eq!(
            "exact".parse::<ColumnOrderPolicy>().unwrap(),
            ColumnOrderPolicy::Exact
        );
        assert!("loose".parse::<ColumnOrderPolicy>().is_err());
    }
}
