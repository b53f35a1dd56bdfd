//! Group call handles and the engine's view of group membership.

use super::call::Recipient;

/// Engine-side client id of a group call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupCallHandle {
    pub client_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupConnectionState {
    NotConnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupJoinState {
    NotJoined,
    Joining,
    Pending,
    Joined,
}

/// A remote device currently in the group call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRemoteDevice {
    pub demux_id: u64,
    pub recipient: Recipient,
    pub audio_muted: Option<bool>,
    pub video_muted: Option<bool>,
    pub presenting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCallEndReason {
    DeviceExplicitlyDisconnected,
    ServerExplicitlyDisconnected,
    CallManagerIsBusy,
    SfuClientFailedToJoin,
    FailedToCreateConnection,
    HasMaxDevices,
    Timeout,
}
