//! Error Types for the Daily Workflow

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CashError>;

#[derive(Error, Debug)]
pub enum CashError {
    #[error("Source {source_id} failed: {message}")]
    SourceFetch {
        source_id: String,
        message: String,
    },

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Wallet {address} lookup failed: {message}")]
    Wallet {
        address: String,
        message: String,
    },

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Asset not supported: {0}")]
    UnsupportedAsset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report parse error: {0}")]
    ReportParse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CashError {
    pub fn source_fetch(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFetch {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is confined to one input and the run may continue.
    ///
    /// Configuration and filesystem errors abort the run.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(CashError::source_fetch("reddit", "timeout").is_recoverable());
        assert!(CashError::Exchange("down".into()).is_recoverable());
        assert!(CashError::ReportParse("no action plan".into()).is_recoverable());
        assert!(!CashError::Config("missing section".into()).is_recoverable());
    }

    #[test]
    fn test_source_fetch_message() {
        let err = CashError::source_fetch("coingecko", "HTTP 429");
        assert_eq!(err.to_string(), "Source coingecko failed: HTTP 429");
    }
}
