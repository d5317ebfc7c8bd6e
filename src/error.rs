use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("Block '{block}' declares more than one resource with filename '{filename}'")]
    DuplicateFilename { block: String, filename: String },

    #[error("Block '{block}' resource '{url}' has an unusable filename '{filename}'")]
    InvalidFilename {
        block: String,
        url: String,
        filename: String,
    },

    #[error("Block '{block}' resource '{url}' is not an absolute URL")]
    InvalidUrl { block: String, url: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SwitchError {
    /// Errors detected from configuration alone, before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SwitchError::DuplicateFilename { .. }
                | SwitchError::InvalidFilename { .. }
                | SwitchError::InvalidUrl { .. }
                | SwitchError::Config(_)
                | SwitchError::Json(_)
        )
    }
}
