use thiserror::Error;

use crate::compare::Side;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },

    #[error("Function '{name}' not found in the {side} module")]
    FunctionNotFound { name: String, side: Side },

    #[error("Function '{function}' of the {side} module is malformed: {source}")]
    MalformedFunction {
        function: String,
        side: Side,
        source: dfinstr::utils::Error,
    },

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

pub type DiffResult<T> = Result<T, DiffError>;
