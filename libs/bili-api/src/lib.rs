pub mod client;
pub mod danmaku;
mod http_client;
pub mod response;

pub use client::{BiliClient, ClientConfig, PlayUrlRequest, VideoId};
pub use danmaku::{decode_danmaku_xml, CommentRecord, DanmakuData, DanmakuResponse, DisplayMode};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiliApiError {
    #[error("Client error: {0}")]
    ClientError(#[from] reqwest::Error),
    #[error("{message} (code {code})")]
    ApiError { code: i64, message: String },
    #[error("Invalid response: {err}")]
    InvalidResponse { err: String },
    #[error("Invalid value for header {name}")]
    InvalidHeader { name: &'static str },
    #[error("Invalid danmaku record #{index}: {err}")]
    InvalidRecord { index: usize, err: String },
}

/// Coarse classification of [`BiliApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be issued or completed: connection failure,
    /// timeout, non-2xx status.
    Transport,
    /// The service answered with a non-zero `code`.
    Protocol,
    /// The payload is missing required fields or is not well formed.
    Structural,
    /// A single danmaku element could not be decoded.
    PartialRecord,
}

impl BiliApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BiliApiError::ClientError(_) | BiliApiError::InvalidHeader { .. } => {
                ErrorKind::Transport
            }
            BiliApiError::ApiError { .. } => ErrorKind::Protocol,
            BiliApiError::InvalidResponse { .. } => ErrorKind::Structural,
            BiliApiError::InvalidRecord { .. } => ErrorKind::PartialRecord,
        }
    }

    pub(crate) fn invalid_response(err: impl ToString) -> Self {
        BiliApiError::InvalidResponse {
            err: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for BiliApiError {
    fn from(value: quick_xml::Error) -> Self {
        Self::invalid_response(value)
    }
}

impl From<serde_json::Error> for BiliApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::invalid_response(value)
    }
}
