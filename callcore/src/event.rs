//! Typed inputs of the state machine.
//!
//! Network receipt, UI actions and engine callbacks are all turned into a
//! [`CallEvent`] and applied in arrival order.

use crate::types::{
    AnswerMetadata, AudioDevice, CallId, CallMetadata, CameraState, GroupCallEndReason,
    GroupCallHandle, GroupConnectionState, GroupId, GroupJoinState, GroupRemoteDevice,
    HangupMetadata, OfferMetadata, OfferType, OpaqueMessageMetadata, ReceivedAnswerMetadata,
    ReceivedOfferMetadata, Recipient, RecipientId, RemotePeer, RingUpdate, ViewState,
};

/// How the remote side ended a 1:1 call, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedRemoteEvent {
    Hangup,
    HangupAccepted,
    HangupDeclined,
    HangupBusy,
    HangupNeedPermission,
    Busy,
    Glare,
    ReCall,
}

impl EndedRemoteEvent {
    pub fn view_state(self) -> ViewState {
        match self {
            Self::Hangup | Self::Glare | Self::ReCall => ViewState::CallDisconnected,
            Self::HangupAccepted => ViewState::CallAcceptedElsewhere,
            Self::HangupDeclined => ViewState::CallDeclinedElsewhere,
            Self::HangupBusy => ViewState::CallOngoingElsewhere,
            Self::HangupNeedPermission => ViewState::CallNeedsPermission,
            Self::Busy => ViewState::CallBusy,
        }
    }
}

/// Local-side reasons the engine ended a 1:1 call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedEvent {
    Timeout,
    InternalFailure,
    SignalingFailure,
    ConnectionFailure,
    ReceivedOfferExpired,
    ReceivedOfferWithGlare,
    IgnoreCallsFromNonMultiringCallers,
}

impl EndedEvent {
    pub fn view_state(self) -> ViewState {
        match self {
            Self::Timeout
            | Self::InternalFailure
            | Self::SignalingFailure
            | Self::ConnectionFailure => ViewState::NetworkFailure,
            Self::ReceivedOfferExpired
            | Self::ReceivedOfferWithGlare
            | Self::IgnoreCallsFromNonMultiringCallers => ViewState::CallDisconnected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    // Pre-join
    PreJoinCall {
        recipient: Recipient,
    },
    CancelPreJoinCall,
    SetRingGroup {
        ring_group: bool,
    },

    // Outgoing call
    OutgoingCall {
        recipient: Recipient,
        offer_type: OfferType,
    },
    StartOutgoingCall {
        remote_peer: RemotePeer,
    },
    SendOffer {
        call_metadata: CallMetadata,
        offer_metadata: OfferMetadata,
        broadcast: bool,
    },
    RemoteRinging {
        remote_peer: RemotePeer,
    },
    ReceivedAnswer {
        call_metadata: CallMetadata,
        answer_metadata: AnswerMetadata,
        received_answer_metadata: ReceivedAnswerMetadata,
    },
    ReceivedBusy {
        call_metadata: CallMetadata,
    },

    // Incoming call
    ReceivedOffer {
        call_metadata: CallMetadata,
        offer_metadata: OfferMetadata,
        received_offer_metadata: ReceivedOfferMetadata,
    },
    ReceivedOfferExpired {
        remote_peer: RemotePeer,
    },
    StartIncomingCall {
        remote_peer: RemotePeer,
    },
    LocalRinging {
        remote_peer: RemotePeer,
    },
    AcceptCall {
        answer_with_video: bool,
    },
    DenyCall,
    SendAnswer {
        call_metadata: CallMetadata,
        answer_metadata: AnswerMetadata,
        broadcast: bool,
    },

    // Active call
    CallConnected {
        remote_peer: RemotePeer,
    },
    ReceivedOfferWhileActive {
        remote_peer: RemotePeer,
    },
    SendBusy {
        call_metadata: CallMetadata,
        broadcast: bool,
    },
    CallConcluded {
        remote_peer: Option<RemotePeer>,
    },
    RemoteVideoEnable {
        enable: bool,
    },
    ScreenSharingEnable {
        enable: bool,
    },
    ReceivedHangup {
        call_metadata: CallMetadata,
        hangup_metadata: HangupMetadata,
    },
    LocalHangup,
    SendHangup {
        call_metadata: CallMetadata,
        hangup_metadata: HangupMetadata,
        broadcast: bool,
    },
    MessageSentSuccess {
        call_id: CallId,
    },
    MessageSentError {
        call_id: CallId,
        error_call_state: ViewState,
        identity_key: Option<Vec<u8>>,
    },
    AudioDeviceChanged {
        active_device: AudioDevice,
        available_devices: Vec<AudioDevice>,
    },
    SetUserAudioDevice {
        device: AudioDevice,
    },

    // Call setup
    SendIceCandidates {
        call_metadata: CallMetadata,
        broadcast: bool,
        ice_candidates: Vec<Vec<u8>>,
    },
    ReceivedIceCandidates {
        call_metadata: CallMetadata,
        ice_candidates: Vec<Vec<u8>>,
    },

    // Local device
    SetEnableVideo {
        enable: bool,
    },
    SetMuteAudio {
        muted: bool,
    },
    SetCameraFlip,
    CameraSwitchCompleted {
        camera_state: CameraState,
    },
    NetworkChanged {
        available: bool,
    },
    BandwidthModeUpdate,
    OrientationChanged {
        landscape_enabled: bool,
        orientation_degrees: i32,
    },

    // End of call
    EndedRemote {
        event: EndedRemoteEvent,
        remote_peer: RemotePeer,
    },
    Ended {
        event: EndedEvent,
        remote_peer: RemotePeer,
    },
    SetupFailure {
        call_id: CallId,
    },

    // Group calling
    GroupLocalDeviceStateChanged {
        connection_state: GroupConnectionState,
        join_state: GroupJoinState,
    },
    GroupRemoteDeviceStateChanged {
        devices: Vec<GroupRemoteDevice>,
    },
    GroupJoinedMembershipChanged,
    GroupCallEnded {
        group_call: GroupCallHandle,
        reason: GroupCallEndReason,
    },
    GroupMessageSentError {
        recipients: Vec<RecipientId>,
        error_call_state: ViewState,
    },
    SendOpaqueMessage {
        recipient: Recipient,
        opaque: Vec<u8>,
        urgent: bool,
    },
    ReceivedOpaqueMessage {
        metadata: OpaqueMessageMetadata,
    },
    GroupCallRingUpdate {
        group: Recipient,
        group_id: GroupId,
        ring_id: i64,
        sender: RecipientId,
        ring_update: RingUpdate,
    },
}

impl CallEvent {
    /// Name of the handler for this event, used in "not processed" logs.
    pub fn handler_name(&self) -> &'static str {
        match self {
            Self::PreJoinCall { .. } => "handle_pre_join_call",
            Self::CancelPreJoinCall => "handle_cancel_pre_join_call",
            Self::SetRingGroup { .. } => "handle_set_ring_group",
            Self::OutgoingCall { .. } => "handle_outgoing_call",
            Self::StartOutgoingCall { .. } => "handle_start_outgoing_call",
            Self::SendOffer { .. } => "handle_send_offer",
            Self::RemoteRinging { .. } => "handle_remote_ringing",
            Self::ReceivedAnswer { .. } => "handle_received_answer",
            Self::ReceivedBusy { .. } => "handle_received_busy",
            Self::ReceivedOffer { .. } => "handle_received_offer",
            Self::ReceivedOfferExpired { .. } => "handle_received_offer_expired",
            Self::StartIncomingCall { .. } => "handle_start_incoming_call",
            Self::LocalRinging { .. } => "handle_local_ringing",
            Self::AcceptCall { .. } => "handle_accept_call",
            Self::DenyCall => "handle_deny_call",
            Self::SendAnswer { .. } => "handle_send_answer",
            Self::CallConnected { .. } => "handle_call_connected",
            Self::ReceivedOfferWhileActive { .. } => "handle_received_offer_while_active",
            Self::SendBusy { .. } => "handle_send_busy",
            Self::CallConcluded { .. } => "handle_call_concluded",
            Self::RemoteVideoEnable { .. } => "handle_remote_video_enable",
            Self::ScreenSharingEnable { .. } => "handle_screen_sharing_enable",
            Self::ReceivedHangup { .. } => "handle_received_hangup",
            Self::LocalHangup => "handle_local_hangup",
            Self::SendHangup { .. } => "handle_send_hangup",
            Self::MessageSentSuccess { .. } => "handle_message_sent_success",
            Self::MessageSentError { .. } => "handle_message_sent_error",
            Self::AudioDeviceChanged { .. } => "handle_audio_device_changed",
            Self::SetUserAudioDevice { .. } => "handle_set_user_audio_device",
            Self::SendIceCandidates { .. } => "handle_send_ice_candidates",
            Self::ReceivedIceCandidates { .. } => "handle_received_ice_candidates",
            Self::SetEnableVideo { .. } => "handle_set_enable_video",
            Self::SetMuteAudio { .. } => "handle_set_mute_audio",
            Self::SetCameraFlip => "handle_set_camera_flip",
            Self::CameraSwitchCompleted { .. } => "handle_camera_switch_completed",
            Self::NetworkChanged { .. } => "handle_network_changed",
            Self::BandwidthModeUpdate => "handle_bandwidth_mode_update",
            Self::OrientationChanged { .. } => "handle_orientation_changed",
            Self::EndedRemote { .. } => "handle_ended_remote",
            Self::Ended { .. } => "handle_ended",
            Self::SetupFailure { .. } => "handle_setup_failure",
            Self::GroupLocalDeviceStateChanged { .. } => "handle_group_local_device_state_changed",
            Self::GroupRemoteDeviceStateChanged { .. } => {
                "handle_group_remote_device_state_changed"
            }
            Self::GroupJoinedMembershipChanged => "handle_group_joined_membership_changed",
            Self::GroupCallEnded { .. } => "handle_group_call_ended",
            Self::GroupMessageSentError { .. } => "handle_group_message_sent_error",
            Self::SendOpaqueMessage { .. } => "handle_send_opaque_message",
            Self::ReceivedOpaqueMessage { .. } => "handle_received_opaque_message",
            Self::GroupCallRingUpdate { .. } => "handle_group_call_ring_update",
        }
    }
}
