//! Descriptors of a single signaling exchange.

use super::call::{CallId, HangupType, OfferType, RecipientId, RemotePeer};

/// Who a signaling message belongs to: the peer and the remote device it came from or goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetadata {
    pub remote_peer: RemotePeer,
    pub remote_device: u32,
}

impl CallMetadata {
    pub fn new(remote_peer: RemotePeer, remote_device: u32) -> Self {
        Self {
            remote_peer,
            remote_device,
        }
    }

    pub fn call_id(&self) -> CallId {
        self.remote_peer.call_id
    }

    /// `<call id>-<remote device>` for log lines.
    pub fn format(&self) -> String {
        self.call_id().format(self.remote_device)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferMetadata {
    pub opaque: Option<Vec<u8>>,
    pub sdp: Option<String>,
    pub offer_type: OfferType,
}

/// Transport-level facts about an offer that arrived from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedOfferMetadata {
    /// Serialized identity key of the caller.
    pub remote_identity_key: Vec<u8>,
    pub server_received_timestamp: i64,
    pub server_delivered_timestamp: i64,
    pub is_multi_ring: bool,
}

impl ReceivedOfferMetadata {
    /// Whole seconds the offer waited on the server, never negative.
    pub fn message_age_secs(&self) -> u64 {
        let age_millis = self
            .server_delivered_timestamp
            .saturating_sub(self.server_received_timestamp)
            .max(0);
        (age_millis / 1000) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerMetadata {
    pub opaque: Option<Vec<u8>>,
    pub sdp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedAnswerMetadata {
    pub remote_identity_key: Vec<u8>,
    pub is_multi_ring: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HangupMetadata {
    pub hangup_type: HangupType,
    pub is_legacy: bool,
    pub device_id: u32,
}

impl HangupMetadata {
    pub fn from_type(hangup_type: HangupType) -> Self {
        Self {
            hangup_type,
            is_legacy: false,
            device_id: 0,
        }
    }
}

/// Opaque group-call engine traffic received from another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueMessageMetadata {
    pub sender: RecipientId,
    pub remote_device_id: u32,
    pub opaque: Vec<u8>,
    pub message_age_seconds: u64,
}
