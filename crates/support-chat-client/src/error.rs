use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not authenticated")]
    Auth,

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Network failures, non-2xx responses, and unreadable bodies.
    ///
    /// These are the failures the poller retries silently on its next tick.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Status { .. } | ClientError::Decode(_)
        )
    }

    /// The request never got an HTTP response
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
