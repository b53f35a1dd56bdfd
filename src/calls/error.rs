//! Error types of the call runtime.

use callcore::types::{RecipientId, ViewState};
use thiserror::Error;

/// Why a signaling message could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("untrusted identity for {recipient}")]
    UntrustedIdentity {
        recipient: RecipientId,
        identity_key: Vec<u8>,
    },

    #[error("recipient is not registered")]
    Unregistered,

    #[error("network failure: {0}")]
    Network(String),

    #[error("transport closed")]
    Closed,
}

impl SendError {
    /// The view state the call shows after this failure.
    pub fn error_call_state(&self) -> ViewState {
        match self {
            Self::UntrustedIdentity { .. } => ViewState::UntrustedIdentity,
            Self::Unregistered => ViewState::NoSuchUser,
            Self::Network(_) | Self::Closed => ViewState::NetworkFailure,
        }
    }

    pub fn identity_key(&self) -> Option<Vec<u8>> {
        match self {
            Self::UntrustedIdentity { identity_key, .. } => Some(identity_key.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RingStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum CallServiceError {
    #[error("call service is not running")]
    QueueClosed,

    #[error(transparent)]
    Store(#[from] RingStoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_errors_map_to_view_states() {
        let untrusted = SendError::UntrustedIdentity {
            recipient: RecipientId::new("alice"),
            identity_key: vec![5, 1],
        };
        assert_eq!(untrusted.error_call_state(), ViewState::UntrustedIdentity);
        assert_eq!(untrusted.identity_key(), Some(vec![5, 1]));

        assert_eq!(
            SendError::Unregistered.error_call_state(),
            ViewState::NoSuchUser
        );
        assert_eq!(
            SendError::Network("timeout".into()).error_call_state(),
            ViewState::NetworkFailure
        );
        assert_eq!(SendError::Closed.error_call_state(), ViewState::NetworkFailure);
        assert_eq!(SendError::Closed.identity_key(), None);
    }
}
