use bili_api::BiliApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("{0}")]
    ApiError(#[from] BiliApiError),
    #[error("No stream available: {reason}")]
    NoStreamAvailable { reason: String },
    #[error("Media player error: {err}")]
    MediaPlayerError { err: String },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config: {err}")]
    ConfigError { err: String },
}

impl PlayerError {
    /// Text shown to the user when a session fails. Errors reported by the
    /// service carry their own message, which is shown as is.
    pub fn detail(&self) -> String {
        match self {
            PlayerError::ApiError(BiliApiError::ApiError { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}
