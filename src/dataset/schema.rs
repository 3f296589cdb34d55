//! Relational schema metadata for one benchmark database. Loaded once
//! per database and shared read-only across every evaluation that
//! touches it.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Case-insensitive column lookup, returning the schema's spelling.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A `(table, column)` pair in the schema's canonical spelling.
pub type ColumnId = (String, String);

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub db_id: String,
    pub tables: Vec<TableSchema>,
    pub primary_keys: Vec<ColumnId>,
    /// `(column, referenced column)` pairs.
    pub foreign_keys: Vec<(ColumnId, ColumnId)>,
}

impl Schema {
    /// Case-insensitive table lookup.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    /// A two-table concert schema in the shape the resolver tests need.
    pub fn concert_schema() -> Schema {
        let table = |name: &str, columns: &[&str]| TableSchema {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|c| ColumnDef {
                    name: c.to_string(),
                    data_type: "text".to_string(),
                })
                .collect(),
        };
        Schema {
            db_id: "concert_singer".to_string(),
            tables: vec![
                table("singer", &["singer_id", "name", "age", "country"]),
                table("concert", &["concert_id", "singer_id", "year"]),
            ],
            primary_keys: vec![
                ("singer".into(), "singer_id".into()),
                ("concert".into(), "concert_id".into()),
            ],
            foreign_keys: vec![(
                ("concert".into(), "singer_id".into()),
                ("singer".into(), "singer_id".into()),
            )],
        }
    }
}
