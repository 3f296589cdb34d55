//! Predictions input: one JSON record per line with the model's SQL.
//! Raw model responses often wrap the query in code fences or prose, so
//! the SQL is extracted before it ever reaches the evaluator.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::DatasetError;

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRecord {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub gold_sql: String,
    pub pred_sql: String,
    #[serde(default)]
    pub db_id: String,
}

/// Reads a predictions JSONL file, skipping blank lines and cleaning
/// each record's `pred_sql`.
pub fn load_predictions(path: &Path) -> Result<Vec<PredictionRecord>, DatasetError> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
    let mut records = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut record: PredictionRecord =
            serde_json::from_str(line).map_err(|e| DatasetError::Json(path.to_path_buf(), e))?;
        record.pred_sql = extract_sql(&record.pred_sql);
        records.push(record);
    }
    Ok(records)
}

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:sql)?\s*").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").unwrap());
static SQL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:sql\s*query:|the\s*sql\s*(?:query|statement)\s*(?:is)?:)\s*").unwrap()
});
static QUERY_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(SELECT|WITH)\s").unwrap());

/// Extracts the SQL statement from a raw model response: strips code
/// fences and "SQL query:" style prefixes, cuts explanation text before
/// the first SELECT/WITH, and trims trailing semicolons.
pub fn extract_sql(response: &str) -> String {
    let mut text = response.trim().to_string();
    text = FENCE_OPEN.replace(&text, "").into_owned();
    text = FENCE_CLOSE.replace(&text, "").into_owned();
    text = SQL_PREFIX.replace(&text, "").into_owned();
    if let Some(m) = QUERY_START.find(&text) {
        text = text[m.start()..].to_string();
    }
    text.trim().trim_end_matches(';').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_fences() {
        assert_eq!(
            extract_sql("```sql\nSELECT * FROM t\n```"),
            "SELECT * FROM t"
        );
        assert_eq!(extract_sql("``` SELECT a FROM t ```"), "SELECT a FROM t");
    }

    #[test]
    fn strips_prefixes_and_explanations() {
        assert_eq!(extract_sql("SQL Query: SELECT a FROM t;"), "SELECT a FROM t");
        assert_eq!(
            extract_sql("Here is the answer.\nSELECT a FROM t"),
            "SELECT a FROM t"
        );
    }

    #[test]
    fn plain_sql_passes_through() {
        assert_eq!(extract_sql("SELECT a FROM t"), "SELECT a FROM t");
        assert_eq!(extract_sql(""), "");
    }
}
