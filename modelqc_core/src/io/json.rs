//! Module providing JSON IO for collected suite results
//!
//! The document layout matches what the test runner emits and the report
//! front end consumes: a `meta` block with environment information and a
//! `tests` map keyed by test id.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::results::result::SuiteResult;

impl SuiteResult {
    /// Read a collected result document from a JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<SuiteResult, ResultJsonError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(ResultJsonError::UnableToRead(format!("{:?}", err))),
        };
        Self::from_json_str(&data)
    }

    /// Parse a collected result document from a JSON string
    pub fn from_json_str(data: &str) -> Result<SuiteResult, ResultJsonError> {
        match serde_json::from_str(data) {
            Ok(result) => Ok(result),
            Err(err) => Err(ResultJsonError::UnableToParse(format!("{:?}", err))),
        }
    }

    /// Write the result document to a JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<(), ResultJsonError> {
        let data = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        fs::write(path, data)?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ResultJsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Serde json serialize error")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}
