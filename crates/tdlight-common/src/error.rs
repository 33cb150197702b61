use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdlightError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Backend rejected request: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Progress stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TdlightError {
    /// Message suitable for a user-facing notice. Backend rejections carry
    /// their own text, everything else falls back to the display form.
    pub fn user_message(&self) -> String {
        match self {
            TdlightError::Rejected(msg) => msg.clone(),
            TdlightError::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TdlightError>;
