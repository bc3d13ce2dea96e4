use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Core error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the computational core can report.
///
/// All variants are terminal for the query in progress; the shell shows the
/// message and lets the user resubmit.
#[derive(Debug, Error)]
pub enum YieldError {
    /// The data file does not exist or could not be opened / read.
    #[error("data file '{}' could not be read: {source}", .path.display())]
    DataNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was readable but its columns or cells do not match the
    /// expected schema.
    #[error("data file '{}' is malformed: {message}", .path.display())]
    DataFormat { path: PathBuf, message: String },

    /// The model artifact is missing, unparsable or structurally invalid.
    #[error("model '{}' could not be loaded: {message}", .path.display())]
    ModelLoad { path: PathBuf, message: String },

    /// A prediction request that the predictor refuses to evaluate.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl YieldError {
    pub fn data_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        YieldError::DataFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn model_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        YieldError::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, YieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path() {
        let err = YieldError::data_format("crops.csv", "missing column 'Yield'");
        assert_eq!(
            err.to_string(),
            "data file 'crops.csv' is malformed: missing column 'Yield'"
        );

        let err = YieldError::InvalidInput("area must be >= 0".into());
        assert_eq!(err.to_string(), "invalid input: area must be >= 0");
    }
}
