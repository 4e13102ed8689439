use thiserror::Error;

#[derive(Error, Debug)]
pub enum StenoForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Incomplete phoneme-to-group mapping or unusable configuration input.
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// The keymap leaves a position group used by the lexicon completely unmapped.
    #[error("Incompatible Keymap: {0}")]
    IncompatibleKeymap(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type SfResult<T> = Result<T, StenoForgeError>;
