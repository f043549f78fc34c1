use reqwest::StatusCode;

use crate::download::retry::{classify_http_status, classify_request_error, ErrorKind};

/// A segment fetch that did not produce a file and was not a plain "not found".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(StatusCode),

    #[error("writing segment: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("concurrency limiter closed")]
    PoolClosed,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Request(err) => classify_request_error(err),
            FetchError::Status(status) => classify_http_status(status.as_u16()),
            FetchError::Io(_) | FetchError::Task(_) | FetchError::PoolClosed => ErrorKind::Other,
        }
    }
}
