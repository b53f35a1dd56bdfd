//! Call-related error types.

use crate::types::CallId;
use thiserror::Error;

/// Failure reported by the RTC engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine rejected operation: {0}")]
    Rejected(String),

    #[error("no active call")]
    NoActiveCall,

    #[error("unknown call: {0}")]
    UnknownCall(CallId),

    #[error("engine failure: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid identity key: {0}")]
    InvalidIdentityKey(String),

    #[error("no active peer")]
    NoActivePeer,
}
