use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("{0}")]
    Config(String),

    #[error("YNAB request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YNAB API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No rule with ID {0}")]
    UnknownRule(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

impl TidyError {
    pub fn is_config(&self) -> bool {
        matches!(self, TidyError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;
