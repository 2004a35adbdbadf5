use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("per-minute API limit reached")]
    RateLimited,
    #[error("monthly API limit of {cap} calls exceeded")]
    QuotaExceeded { cap: u32 },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    /// True for admission denials the caller may retry later.
    pub fn is_throttled(&self) -> bool {
        matches!(self, AppError::RateLimited | AppError::QuotaExceeded { .. })
    }
}
