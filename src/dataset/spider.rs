//! Spider dataset reader: `dev.json` holds the examples (question, gold
//! query, database id), `tables.json` the schema metadata per database.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::schema::{ColumnDef, Schema, TableSchema};
use super::DatasetError;

#[derive(Debug, Clone)]
pub struct SpiderExample {
    pub question: String,
    pub gold_sql: String,
    pub db_id: String,
}

#[derive(Debug, Deserialize)]
struct RawExample {
    question: String,
    query: String,
    db_id: String,
}

/// `tables.json` record layout. Column lists are indexed globally per
/// database; entry 0 is the `*` pseudo-column with table index -1.
#[derive(Debug, Deserialize)]
struct RawSchema {
    db_id: String,
    table_names_original: Vec<String>,
    column_names_original: Vec<(i64, String)>,
    #[serde(default)]
    column_types: Vec<String>,
    #[serde(default)]
    primary_keys: Vec<usize>,
    #[serde(default)]
    foreign_keys: Vec<(usize, usize)>,
}

#[derive(Debug)]
pub struct SpiderDataset {
    examples: Vec<SpiderExample>,
    schemas: BTreeMap<String, Schema>,
}

impl SpiderDataset {
    /// Loads the dev set and schema metadata from a Spider root
    /// directory. Both files are read once; the result is immutable.
    pub fn load(root: &Path, dev_filename: &str, tables_filename: &str) -> Result<Self, DatasetError> {
        let dev_path = root.join(dev_filename);
        let raw_examples: Vec<RawExample> = read_json(&dev_path)?;
        let examples = raw_examples
            .into_iter()
            .map(|raw| SpiderExample {
                question: raw.question,
                gold_sql: raw.query,
                db_id: raw.db_id,
            })
            .collect::<Vec<_>>();
        debug!("loaded {} examples from {}", examples.len(), dev_path.display());

        let tables_path = root.join(tables_filename);
        let raw_schemas: Vec<RawSchema> = read_json(&tables_path)?;
        let mut schemas = BTreeMap::new();
        for raw in raw_schemas {
            let schema = convert_schema(raw)?;
            schemas.insert(schema.db_id.clone(), schema);
        }
        debug!(
            "loaded {} database schemas from {}",
            schemas.len(),
            tables_path.display()
        );

        Ok(Self { examples, schemas })
    }

    pub fn examples(&self) -> &[SpiderExample] {
        &self.examples
    }

    pub fn schema(&self, db_id: &str) -> Option<&Schema> {
        self.schemas.get(db_id)
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, DatasetError> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::Io(path.clone(), e))?;
    serde_json::from_str(&text).map_err(|e| DatasetError::Json(path.clone(), e))
}

fn convert_schema(raw: RawSchema) -> Result<Schema, DatasetError> {
    let mut tables: Vec<TableSchema> = raw
        .table_names_original
        .iter()
        .map(|name| TableSchema {
            name: name.clone(),
            columns: Vec::new(),
        })
        .collect();

    // Global column index -> (table, column), for primary/foreign keys.
    let mut column_ids = Vec::with_capacity(raw.column_names_original.len());
    for (i, (table_idx, column_name)) in raw.column_names_original.iter().enumerate() {
        if *table_idx < 0 {
            // The `*` pseudo-column.
            column_ids.push(None);
            continue;
        }
        let table_idx = *table_idx as usize;
        let table = tables.get_mut(table_idx).ok_or_else(|| {
            DatasetError::Malformed(format!(
                "{}: column {:?} references table index {} out of range",
                raw.db_id, column_name, table_idx
            ))
        })?;
        let data_type = raw
            .column_types
            .get(i)
            .cloned()
            .unwrap_or_else(|| "text".to_string());
        table.columns.push(ColumnDef {
            name: column_name.clone(),
            data_type,
        });
        column_ids.push(Some((table.name.clone(), column_name.clone())));
    }

    let column_id = |idx: usize| -> Result<(String, String), DatasetError> {
        column_ids
            .get(idx)
            .cloned()
            .flatten()
            .ok_or_else(|| {
                DatasetError::Malformed(format!("{}: key column index {} out of range", raw.db_id, idx))
            })
    };

    let mut primary_keys = Vec::new();
    for idx in raw.primary_keys {
        primary_keys.push(column_id(idx)?);
    }
    let mut foreign_keys = Vec::new();
    for (from, to) in raw.foreign_keys {
        foreign_keys.push((column_id(from)?, column_id(to)?));
    }

    Ok(Schema {
        db_id: raw.db_id,
        tables,
        primary_keys,
        foreign_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_raw_schema_with_keys() {
        let raw: RawSchema = serde_json::from_str(
            r#"{
                "db_id": "concert_singer",
                "table_names_original": ["singer", "concert"],
                "column_names_original": [
                    [-1, "*"],
                    [0, "Singer_ID"], [0, "Name"],
                    [1, "Concert_ID"], [1, "Singer_ID"]
                ],
                "column_types": ["text", "number", "text", "number", "number"],
                "primary_keys": [1, 3],
                "foreign_keys": [[4, 1]]
            }"#,
        )
        .unwrap();
        let schema = convert_schema(raw).unwrap();
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(schema.tables[0].columns.len(), 2);
        assert_eq!(schema.primary_keys[0], ("singer".into(), "Singer_ID".into()));
        assert_eq!(
            schema.foreign_keys[0],
            (
                ("concert".into(), "Singer_ID".into()),
                ("singer".into(), "Singer_ID".into())
            )
        );
        assert!(schema.table("SINGER").is_some());
        assert!(schema.table("singer").unwrap().column("name").is_some());
    }

    #[test]
    fn key_index_out_of_range_is_malformed() {
        let raw = RawSchema {
            db_id: "x".into(),
            table_names_original: vec!["t".into()],
            column_names_original: vec![(-1, "*".into()), (0, "a".into())],
            column_types: vec![],
            primary_keys: vec![9],
            foreign_keys: vec![],
        };
        assert!(convert_schema(raw).is_err());
    }
}
