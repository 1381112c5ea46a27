use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrestacaoError {
    #[error("Config directory not found at {0}. Run 'prestacao init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Statement file not found: {0}")]
    StatementNotFound(PathBuf),

    #[error("Failed to parse statement file {path}: {source}")]
    StatementParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Statement has no units. Add at least one [[units]] entry.")]
    NoUnits,

    #[error("Unit '{0}' is listed more than once")]
    DuplicateUnit(String),

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidAmount {
        field: String,
        value: f64,
        reason: String,
    },

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),
}

pub type Result<T> = std::result::Result<T, PrestacaoError>;
