//! Errors raised while fetching, encoding, or saving reports.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The report source answered with a non-success status
    #[error("HTTP error! Status: {status}")]
    Http { status: u16 },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(String),

    /// A body could not be decoded, or records could not be encoded
    #[error("Invalid report data: {0}")]
    Decode(String),

    #[error("Failed to save {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ureq::Error> for ReportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => ReportError::Http { status },
            ureq::Error::Transport(transport) => ReportError::Transport(transport.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Decode(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_carries_status() {
        let err = ReportError::Http { status: 500 };
        assert!(err.to_string().contains("500"));
    }
}
