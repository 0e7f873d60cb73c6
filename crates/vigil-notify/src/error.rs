use vigil_common::channel::{ChannelConfigError, ChannelType};

/// Errors that can occur while delivering a notification.
///
/// The dispatcher distinguishes permanent failures (never retried) from
/// transient ones (retried with backoff) via [`NotifyError::is_permanent`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or does not
    /// match the notifier's channel type. Permanent.
    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// No notifier is registered for the channel's type. Permanent.
    #[error("no notifier registered for channel type '{0}'")]
    UnknownChannelType(ChannelType),

    /// The request could not be performed (connect, DNS, TLS). Transient.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    /// 4xx (except 429) is permanent; everything else is transient.
    #[error("endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// SMTP transport failure. Transient.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// The send did not complete within the per-send timeout. Transient.
    #[error("send timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl NotifyError {
    /// Whether retrying this failure can never succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            NotifyError::InvalidConfig(_) | NotifyError::UnknownChannelType(_) => true,
            NotifyError::Endpoint { status, .. } => {
                (400..500).contains(status) && *status != 429
            }
            NotifyError::Http(_) | NotifyError::Smtp(_) | NotifyError::Timeout(_) => false,
        }
    }
}

impl From<ChannelConfigError> for NotifyError {
    fn from(e: ChannelConfigError) -> Self {
        NotifyError::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
