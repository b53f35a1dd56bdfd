//! Identifiers and per-peer call bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one call instance, assigned by the RTC engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(u64);

impl CallId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Log-friendly `<call id>-<remote device>` rendering.
    pub fn format(&self, remote_device: u32) -> String {
        format!("{}-{}", self.0, remote_device)
    }
}

impl From<u64> for CallId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a contact or a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecipientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw group identifier as understood by the group-call engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(Vec<u8>);

impl GroupId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A party we can call: a single contact or a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub group_id: Option<GroupId>,
}

impl Recipient {
    pub fn individual(id: impl Into<String>) -> Self {
        Self {
            id: RecipientId::new(id),
            group_id: None,
        }
    }

    pub fn group(id: impl Into<String>, group_id: GroupId) -> Self {
        Self {
            id: RecipientId::new(id),
            group_id: Some(group_id),
        }
    }

    /// The local user, used for the self-view participant.
    pub fn local() -> Self {
        Self::individual("local")
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }
}

/// Lifecycle of a single remote peer inside a 1:1 call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeerCallState {
    #[default]
    Idle,
    Dialing,
    Answering,
    RemoteRinging,
    LocalRinging,
    Connected,
    Terminated,
    ReceivedBusy,
}

/// One remote party of a 1:1 call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePeer {
    pub recipient: Recipient,
    pub call_id: CallId,
    pub state: PeerCallState,
    /// Millisecond timestamp the call started at (server-received time for incoming calls).
    pub call_start_timestamp: i64,
}

impl RemotePeer {
    pub fn new(recipient: Recipient, call_id: CallId) -> Self {
        Self {
            recipient,
            call_id,
            state: PeerCallState::Idle,
            call_start_timestamp: 0,
        }
    }

    /// Peers are the same call when their call ids match; the recipient is not compared.
    pub fn call_id_equals(&self, other: Option<&RemotePeer>) -> bool {
        other.is_some_and(|other| self.call_id == other.call_id)
    }

    pub fn with_call_start_timestamp(mut self, timestamp: i64) -> Self {
        self.call_start_timestamp = timestamp;
        self
    }

    fn with_state(mut self, state: PeerCallState) -> Self {
        self.state = state;
        self
    }

    pub fn dialing(self) -> Self {
        self.with_state(PeerCallState::Dialing)
    }

    pub fn answering(self) -> Self {
        self.with_state(PeerCallState::Answering)
    }

    pub fn remote_ringing(self) -> Self {
        self.with_state(PeerCallState::RemoteRinging)
    }

    pub fn local_ringing(self) -> Self {
        self.with_state(PeerCallState::LocalRinging)
    }

    pub fn connected(self) -> Self {
        self.with_state(PeerCallState::Connected)
    }

    pub fn received_busy(self) -> Self {
        self.with_state(PeerCallState::ReceivedBusy)
    }

    pub fn terminated(self) -> Self {
        self.with_state(PeerCallState::Terminated)
    }

    /// Whether hanging up from this peer state should play the disconnect tone.
    pub fn plays_disconnect_sound(&self) -> bool {
        matches!(
            self.state,
            PeerCallState::Dialing
                | PeerCallState::RemoteRinging
                | PeerCallState::ReceivedBusy
                | PeerCallState::Connected
        )
    }
}

/// Media type requested by an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    #[default]
    Audio,
    Video,
}

impl OfferType {
    pub fn is_video(self) -> bool {
        self == Self::Video
    }
}

/// Reason code carried by a hangup message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HangupType {
    #[default]
    Normal,
    Accepted,
    Declined,
    Busy,
    NeedPermission,
}

/// Group ring notification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingUpdate {
    Requested,
    ExpiredRequest,
    AcceptedOnAnotherDevice,
    DeclinedOnAnotherDevice,
    BusyLocally,
    BusyOnAnotherDevice,
    CancelledByRinger,
}

impl RingUpdate {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::BusyLocally | Self::BusyOnAnotherDevice)
    }
}

/// Why a group ring is cancelled towards the ringer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingCancelReason {
    DeclinedByUser,
    Busy,
}

/// Persisted last-known state of one group ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRingRecord {
    pub ring_id: i64,
    pub timestamp: i64,
    pub ring_update: RingUpdate,
}
