use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmergenceError {
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Schema mismatch in {}: missing column `{column}`", path.display())]
    Schema { path: PathBuf, column: String },

    #[error("Invalid value {value:?} for `{column}` in {} (line {line})", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EmergenceError>;
