//! The RTC engine as seen by the state machine.
//!
//! Implementations own the media pipeline and report back asynchronously
//! through events posted to the call service (`StartOutgoingCall`,
//! `CallConnected`, `EndedRemote`, ...). Every method here only enqueues work
//! on the engine side and must return promptly.

use crate::error::EngineError;
use crate::types::{
    BandwidthMode, CallId, GroupCallHandle, GroupId, HangupType, OfferType, RecipientId,
    RemotePeer, RingCancelReason,
};

pub type EngineResult<T = ()> = Result<T, EngineError>;

/// Everything the engine needs to process an offer from a remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingOffer {
    pub call_id: CallId,
    pub remote_peer: RemotePeer,
    pub remote_device: u32,
    pub opaque: Vec<u8>,
    pub message_age_secs: u64,
    pub media_type: OfferType,
    pub local_device: u32,
    pub is_multi_ring: bool,
    pub sender_identity_key: Vec<u8>,
    pub receiver_identity_key: Vec<u8>,
}

pub trait CallEngine: Send + Sync {
    /// Creates an outgoing 1:1 call and returns the id the engine assigned to it.
    fn call(&self, remote_peer: &RecipientId, media_type: OfferType, local_device: u32)
    -> EngineResult<CallId>;

    fn proceed(&self, call_id: CallId, bandwidth_mode: BandwidthMode) -> EngineResult;

    fn accept_call(&self, call_id: CallId) -> EngineResult;

    fn hangup(&self) -> EngineResult;

    fn received_offer(&self, offer: &IncomingOffer) -> EngineResult;

    fn received_answer(
        &self,
        call_id: CallId,
        remote_device: u32,
        opaque: &[u8],
        is_multi_ring: bool,
        sender_identity_key: &[u8],
        receiver_identity_key: &[u8],
    ) -> EngineResult;

    fn received_busy(&self, call_id: CallId, remote_device: u32) -> EngineResult;

    fn received_hangup(
        &self,
        call_id: CallId,
        remote_device: u32,
        hangup_type: HangupType,
        device_id: u32,
    ) -> EngineResult;

    fn received_ice_candidates(
        &self,
        call_id: CallId,
        remote_device: u32,
        candidates: &[Vec<u8>],
    ) -> EngineResult;

    /// Opaque group-call traffic.
    fn received_call_message(
        &self,
        sender: &RecipientId,
        sender_device: u32,
        local_device: u32,
        message: &[u8],
        message_age_secs: u64,
    ) -> EngineResult;

    fn message_sent(&self, call_id: CallId) -> EngineResult;

    fn message_send_failure(&self, call_id: CallId) -> EngineResult;

    /// Drops every call the engine knows about.
    fn reset(&self) -> EngineResult;

    fn cancel_group_ring(
        &self,
        group_id: &GroupId,
        ring_id: i64,
        reason: RingCancelReason,
    ) -> EngineResult;

    fn update_bandwidth_mode(&self, mode: BandwidthMode) -> EngineResult;

    fn set_audio_enabled(&self, enabled: bool) -> EngineResult;

    fn set_video_enabled(&self, enabled: bool) -> EngineResult;

    fn create_group_call(&self, group_id: &GroupId) -> EngineResult<GroupCallHandle>;

    fn connect_group_call(&self, group_call: GroupCallHandle) -> EngineResult;

    fn join_group_call(&self, group_call: GroupCallHandle) -> EngineResult;

    fn disconnect_group_call(&self, group_call: GroupCallHandle) -> EngineResult;

    fn ring_group(&self, group_call: GroupCallHandle) -> EngineResult;

    fn set_group_outgoing_audio_muted(&self, group_call: GroupCallHandle, muted: bool)
    -> EngineResult;

    fn set_group_outgoing_video_muted(&self, group_call: GroupCallHandle, muted: bool)
    -> EngineResult;
}
