//! Capabilities the state machine may use while handling an event.

use crate::engine::CallEngine;
use crate::messages::CallMessage;
use crate::state::ServiceState;
use crate::types::{
    AudioDevice, BandwidthMode, CallInProgressKind, GroupRingRecord, PhoneState, Recipient,
    RecipientId, RemotePeer, RingUpdate,
};

/// The world outside the state machine: network, engine, audio, platform.
///
/// Every method must return without waiting on I/O. Implementations that
/// talk to the network dispatch the work and report the outcome as a later
/// event (`MessageSentSuccess` / `MessageSentError`).
pub trait CallInteractor: Send + Sync {
    fn engine(&self) -> &dyn CallEngine;

    fn local_device_id(&self) -> u32;

    fn send_call_message(&self, recipient: &Recipient, message: CallMessage);

    /// Tells the group that our view of the call changed (joined or left).
    fn send_group_call_message(&self, group: &Recipient);

    fn insert_missed_call(&self, remote_peer: &RemotePeer, timestamp: i64, is_video_offer: bool);

    fn update_phone_state(&self, phone_state: PhoneState);

    fn stop_audio(&self, play_disconnect_sound: bool);

    fn start_incoming_ringer(&self, recipient: &Recipient, vibrate: bool);

    fn start_outgoing_ringer(&self);

    fn set_user_audio_device(&self, device: AudioDevice);

    fn set_call_in_progress_notification(&self, kind: CallInProgressKind, recipient: &Recipient);

    fn stop_foreground_service(&self);

    /// Publishes an intermediate state, e.g. a terminal error before teardown.
    fn post_state_update(&self, state: &ServiceState);

    fn is_any_pstn_line_busy(&self) -> bool;

    fn is_call_request_accepted(&self, recipient: &Recipient) -> bool;

    /// Serialized (type-prefixed) local identity key.
    fn local_identity_key(&self) -> Vec<u8>;

    fn bandwidth_mode(&self) -> BandwidthMode;

    fn set_camera_orientation(&self, degrees: i32);

    fn group_ring(&self, ring_id: i64) -> Option<GroupRingRecord>;

    fn insert_or_update_group_ring(&self, ring_id: i64, timestamp: i64, ring_update: RingUpdate);

    fn start_group_ringing(&self, group: &Recipient, ring_id: i64, sender: &RecipientId);
}
