//! Benchmark input loading: Spider-style dataset files (`dev.json`,
//! `tables.json`) and the predictions JSONL produced by a model run.

pub mod predictions;
pub mod schema;
pub mod spider;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum DatasetError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
    Malformed(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(path, err) => write!(f, "failed to read {}: {}", path.display(), err),
            DatasetError::Json(path, err) => {
                write!(f, "failed to parse {}: {}", path.display(), err)
            }
            DatasetError::Malformed(msg) => write!(f, "malformed dataset: {}", msg),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DatasetError::Io(_, err) => Some(err),
            DatasetError::Json(_, err) => Some(err),
            DatasetError::Malformed(_) => None,
        }
    }
}
