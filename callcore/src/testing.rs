//! Recording doubles for the engine and the interactor.
//!
//! Both record every call they receive so tests can assert on exact side
//! effects, including the absence of any.

use crate::engine::{CallEngine, EngineResult, IncomingOffer};
use crate::error::EngineError;
use crate::interactor::CallInteractor;
use crate::messages::CallMessage;
use crate::state::ServiceState;
use crate::types::{
    AudioDevice, BandwidthMode, CallId, CallInProgressKind, GroupCallHandle, GroupId,
    GroupRingRecord, HangupType, OfferType, PhoneState, Recipient, RecipientId, RemotePeer,
    RingCancelReason, RingUpdate, ViewState,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Call {
        recipient: RecipientId,
        media_type: OfferType,
    },
    Proceed(CallId),
    AcceptCall(CallId),
    Hangup,
    ReceivedOffer(IncomingOffer),
    ReceivedAnswer {
        call_id: CallId,
        remote_device: u32,
        sender_identity_key: Vec<u8>,
        receiver_identity_key: Vec<u8>,
    },
    ReceivedBusy(CallId),
    ReceivedHangup {
        call_id: CallId,
        hangup_type: HangupType,
        device_id: u32,
    },
    ReceivedIceCandidates {
        call_id: CallId,
        count: usize,
    },
    ReceivedCallMessage {
        sender: RecipientId,
        message_age_secs: u64,
    },
    MessageSent(CallId),
    MessageSendFailure(CallId),
    Reset,
    CancelGroupRing {
        group_id: GroupId,
        ring_id: i64,
        reason: RingCancelReason,
    },
    UpdateBandwidthMode(BandwidthMode),
    SetAudioEnabled(bool),
    SetVideoEnabled(bool),
    CreateGroupCall(GroupId),
    ConnectGroupCall(GroupCallHandle),
    JoinGroupCall(GroupCallHandle),
    DisconnectGroupCall(GroupCallHandle),
    RingGroup(GroupCallHandle),
    SetGroupOutgoingAudioMuted(bool),
    SetGroupOutgoingVideoMuted(bool),
}

/// Engine double; operations named with [`RecordingEngine::fail_on`] return an error.
#[derive(Debug)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    failing: Mutex<HashSet<&'static str>>,
    next_call_id: AtomicU64,
    next_client_id: AtomicU32,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_call_id: AtomicU64::new(1000),
            next_client_id: AtomicU32::new(1),
        }
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call to `operation` (the trait method name) fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing
            .lock()
            .expect("failing set poisoned")
            .insert(operation);
    }

    /// The id the next `call()` will hand out.
    pub fn set_next_call_id(&self, call_id: u64) {
        self.next_call_id.store(call_id, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("call log poisoned").clear();
    }

    fn record(&self, operation: &'static str, call: EngineCall) -> EngineResult {
        self.calls.lock().expect("call log poisoned").push(call);
        if self
            .failing
            .lock()
            .expect("failing set poisoned")
            .contains(operation)
        {
            Err(EngineError::Rejected(operation.to_string()))
        } else {
            Ok(())
        }
    }
}

impl CallEngine for RecordingEngine {
    fn call(
        &self,
        remote_peer: &RecipientId,
        media_type: OfferType,
        _local_device: u32,
    ) -> EngineResult<CallId> {
        self.record(
            "call",
            EngineCall::Call {
                recipient: remote_peer.clone(),
                media_type,
            },
        )?;
        Ok(CallId::new(self.next_call_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn proceed(&self, call_id: CallId, _bandwidth_mode: BandwidthMode) -> EngineResult {
        self.record("proceed", EngineCall::Proceed(call_id))
    }

    fn accept_call(&self, call_id: CallId) -> EngineResult {
        self.record("accept_call", EngineCall::AcceptCall(call_id))
    }

    fn hangup(&self) -> EngineResult {
        self.record("hangup", EngineCall::Hangup)
    }

    fn received_offer(&self, offer: &IncomingOffer) -> EngineResult {
        self.record("received_offer", EngineCall::ReceivedOffer(offer.clone()))
    }

    fn received_answer(
        &self,
        call_id: CallId,
        remote_device: u32,
        _opaque: &[u8],
        _is_multi_ring: bool,
        sender_identity_key: &[u8],
        receiver_identity_key: &[u8],
    ) -> EngineResult {
        self.record(
            "received_answer",
            EngineCall::ReceivedAnswer {
                call_id,
                remote_device,
                sender_identity_key: sender_identity_key.to_vec(),
                receiver_identity_key: receiver_identity_key.to_vec(),
            },
        )
    }

    fn received_busy(&self, call_id: CallId, _remote_device: u32) -> EngineResult {
        self.record("received_busy", EngineCall::ReceivedBusy(call_id))
    }

    fn received_hangup(
        &self,
        call_id: CallId,
        _remote_device: u32,
        hangup_type: HangupType,
        device_id: u32,
    ) -> EngineResult {
        self.record(
            "received_hangup",
            EngineCall::ReceivedHangup {
                call_id,
                hangup_type,
                device_id,
            },
        )
    }

    fn received_ice_candidates(
        &self,
        call_id: CallId,
        _remote_device: u32,
        candidates: &[Vec<u8>],
    ) -> EngineResult {
        self.record(
            "received_ice_candidates",
            EngineCall::ReceivedIceCandidates {
                call_id,
                count: candidates.len(),
            },
        )
    }

    fn received_call_message(
        &self,
        sender: &RecipientId,
        _sender_device: u32,
        _local_device: u32,
        _message: &[u8],
        message_age_secs: u64,
    ) -> EngineResult {
        self.record(
            "received_call_message",
            EngineCall::ReceivedCallMessage {
                sender: sender.clone(),
                message_age_secs,
            },
        )
    }

    fn message_sent(&self, call_id: CallId) -> EngineResult {
        self.record("message_sent", EngineCall::MessageSent(call_id))
    }

    fn message_send_failure(&self, call_id: CallId) -> EngineResult {
        self.record("message_send_failure", EngineCall::MessageSendFailure(call_id))
    }

    fn reset(&self) -> EngineResult {
        self.record("reset", EngineCall::Reset)
    }

    fn cancel_group_ring(
        &self,
        group_id: &GroupId,
        ring_id: i64,
        reason: RingCancelReason,
    ) -> EngineResult {
        self.record(
            "cancel_group_ring",
            EngineCall::CancelGroupRing {
                group_id: group_id.clone(),
                ring_id,
                reason,
            },
        )
    }

    fn update_bandwidth_mode(&self, mode: BandwidthMode) -> EngineResult {
        self.record("update_bandwidth_mode", EngineCall::UpdateBandwidthMode(mode))
    }

    fn set_audio_enabled(&self, enabled: bool) -> EngineResult {
        self.record("set_audio_enabled", EngineCall::SetAudioEnabled(enabled))
    }

    fn set_video_enabled(&self, enabled: bool) -> EngineResult {
        self.record("set_video_enabled", EngineCall::SetVideoEnabled(enabled))
    }

    fn create_group_call(&self, group_id: &GroupId) -> EngineResult<GroupCallHandle> {
        self.record("create_group_call", EngineCall::CreateGroupCall(group_id.clone()))?;
        Ok(GroupCallHandle {
            client_id: self.next_client_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn connect_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.record("connect_group_call", EngineCall::ConnectGroupCall(group_call))
    }

    fn join_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.record("join_group_call", EngineCall::JoinGroupCall(group_call))
    }

    fn disconnect_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.record(
            "disconnect_group_call",
            EngineCall::DisconnectGroupCall(group_call),
        )
    }

    fn ring_group(&self, group_call: GroupCallHandle) -> EngineResult {
        self.record("ring_group", EngineCall::RingGroup(group_call))
    }

    fn set_group_outgoing_audio_muted(
        &self,
        _group_call: GroupCallHandle,
        muted: bool,
    ) -> EngineResult {
        self.record(
            "set_group_outgoing_audio_muted",
            EngineCall::SetGroupOutgoingAudioMuted(muted),
        )
    }

    fn set_group_outgoing_video_muted(
        &self,
        _group_call: GroupCallHandle,
        muted: bool,
    ) -> EngineResult {
        self.record(
            "set_group_outgoing_video_muted",
            EngineCall::SetGroupOutgoingVideoMuted(muted),
        )
    }
}

/// Everything the state machine did to the outside world, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    SendCallMessage {
        recipient: RecipientId,
        message: CallMessage,
    },
    SendGroupCallMessage(RecipientId),
    MissedCall {
        call_id: CallId,
        timestamp: i64,
        is_video_offer: bool,
    },
    PhoneState(PhoneState),
    StopAudio {
        play_disconnect_sound: bool,
    },
    IncomingRinger(RecipientId),
    OutgoingRinger,
    UserAudioDevice(AudioDevice),
    Notification(CallInProgressKind),
    StopForegroundService,
    StateUpdate(ViewState),
    CameraOrientation(i32),
    GroupRingUpdated {
        ring_id: i64,
        ring_update: RingUpdate,
    },
    GroupRinging {
        ring_id: i64,
        sender: RecipientId,
    },
}

pub struct RecordingInteractor {
    pub engine: RecordingEngine,
    effects: Mutex<Vec<SideEffect>>,
    rings: Mutex<HashMap<i64, GroupRingRecord>>,
    pstn_line_busy: AtomicBool,
    accept_calls: AtomicBool,
    identity_key: Vec<u8>,
}

impl Default for RecordingInteractor {
    fn default() -> Self {
        let mut identity_key = vec![crate::identity::DJB_TYPE];
        identity_key.extend_from_slice(&[0x11; 32]);
        Self {
            engine: RecordingEngine::new(),
            effects: Mutex::new(Vec::new()),
            rings: Mutex::new(HashMap::new()),
            pstn_line_busy: AtomicBool::new(false),
            accept_calls: AtomicBool::new(true),
            identity_key,
        }
    }
}

impl RecordingInteractor {
    pub const LOCAL_DEVICE_ID: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pstn_line_busy(&self, busy: bool) {
        self.pstn_line_busy.store(busy, Ordering::SeqCst);
    }

    pub fn set_accept_calls(&self, accept: bool) {
        self.accept_calls.store(accept, Ordering::SeqCst);
    }

    pub fn effects(&self) -> Vec<SideEffect> {
        self.effects.lock().expect("effect log poisoned").clone()
    }

    /// Call messages sent so far, in order.
    pub fn sent_messages(&self) -> Vec<CallMessage> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                SideEffect::SendCallMessage { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn missed_calls(&self) -> usize {
        self.effects()
            .iter()
            .filter(|effect| matches!(effect, SideEffect::MissedCall { .. }))
            .count()
    }

    /// True when neither the interactor nor the engine were touched.
    pub fn is_untouched(&self) -> bool {
        self.effects().is_empty() && self.engine.calls().is_empty()
    }

    /// Forgets recorded effects and engine calls, keeping configuration.
    pub fn clear(&self) {
        self.effects.lock().expect("effect log poisoned").clear();
        self.engine.clear();
    }

    fn push(&self, effect: SideEffect) {
        self.effects.lock().expect("effect log poisoned").push(effect);
    }
}

impl CallInteractor for RecordingInteractor {
    fn engine(&self) -> &dyn CallEngine {
        &self.engine
    }

    fn local_device_id(&self) -> u32 {
        Self::LOCAL_DEVICE_ID
    }

    fn send_call_message(&self, recipient: &Recipient, message: CallMessage) {
        self.push(SideEffect::SendCallMessage {
            recipient: recipient.id.clone(),
            message,
        });
    }

    fn send_group_call_message(&self, group: &Recipient) {
        self.push(SideEffect::SendGroupCallMessage(group.id.clone()));
    }

    fn insert_missed_call(&self, remote_peer: &RemotePeer, timestamp: i64, is_video_offer: bool) {
        self.push(SideEffect::MissedCall {
            call_id: remote_peer.call_id,
            timestamp,
            is_video_offer,
        });
    }

    fn update_phone_state(&self, phone_state: PhoneState) {
        self.push(SideEffect::PhoneState(phone_state));
    }

    fn stop_audio(&self, play_disconnect_sound: bool) {
        self.push(SideEffect::StopAudio {
            play_disconnect_sound,
        });
    }

    fn start_incoming_ringer(&self, recipient: &Recipient, _vibrate: bool) {
        self.push(SideEffect::IncomingRinger(recipient.id.clone()));
    }

    fn start_outgoing_ringer(&self) {
        self.push(SideEffect::OutgoingRinger);
    }

    fn set_user_audio_device(&self, device: AudioDevice) {
        self.push(SideEffect::UserAudioDevice(device));
    }

    fn set_call_in_progress_notification(&self, kind: CallInProgressKind, _recipient: &Recipient) {
        self.push(SideEffect::Notification(kind));
    }

    fn stop_foreground_service(&self) {
        self.push(SideEffect::StopForegroundService);
    }

    fn post_state_update(&self, state: &ServiceState) {
        self.push(SideEffect::StateUpdate(state.call_info.call_state));
    }

    fn is_any_pstn_line_busy(&self) -> bool {
        self.pstn_line_busy.load(Ordering::SeqCst)
    }

    fn is_call_request_accepted(&self, _recipient: &Recipient) -> bool {
        self.accept_calls.load(Ordering::SeqCst)
    }

    fn local_identity_key(&self) -> Vec<u8> {
        self.identity_key.clone()
    }

    fn bandwidth_mode(&self) -> BandwidthMode {
        BandwidthMode::Normal
    }

    fn set_camera_orientation(&self, degrees: i32) {
        self.push(SideEffect::CameraOrientation(degrees));
    }

    fn group_ring(&self, ring_id: i64) -> Option<GroupRingRecord> {
        self.rings
            .lock()
            .expect("ring map poisoned")
            .get(&ring_id)
            .copied()
    }

    fn insert_or_update_group_ring(&self, ring_id: i64, timestamp: i64, ring_update: RingUpdate) {
        self.rings.lock().expect("ring map poisoned").insert(
            ring_id,
            GroupRingRecord {
                ring_id,
                timestamp,
                ring_update,
            },
        );
        self.push(SideEffect::GroupRingUpdated {
            ring_id,
            ring_update,
        });
    }

    fn start_group_ringing(&self, _group: &Recipient, ring_id: i64, sender: &RecipientId) {
        self.push(SideEffect::GroupRinging {
            ring_id,
            sender: sender.clone(),
        });
    }
}
