use super::ActionProcessor;
use crate::event::{CallEvent, EndedEvent, EndedRemoteEvent};
use crate::identity::DJB_TYPE;
use crate::messages::CallMessageBody;
use crate::state::ServiceState;
use crate::testing::{EngineCall, RecordingInteractor, SideEffect};
use crate::types::{
    AnswerMetadata, AudioDevice, BroadcastVideoSink, CallId, CallInProgressKind, CallMetadata,
    CameraDirection, CameraState, GroupCallEndReason, GroupCallHandle, GroupCallState,
    GroupConnectionState, GroupId, GroupJoinState, GroupRemoteDevice, HangupType, OfferMetadata,
    OfferType, Orientation, PeerCallState, PhoneState, ReceivedAnswerMetadata,
    ReceivedOfferMetadata, Recipient, RecipientId, RemotePeer, RingCancelReason, RingUpdate,
    ViewState,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn alice() -> Recipient {
    Recipient::individual("alice")
}

fn peer(id: u64) -> RemotePeer {
    RemotePeer::new(alice(), CallId::new(id))
}

fn group() -> Recipient {
    Recipient::group("friends", GroupId::new(vec![0xca, 0xfe]))
}

fn serialized_key(fill: u8) -> Vec<u8> {
    let mut key = vec![DJB_TYPE];
    key.extend_from_slice(&[fill; 32]);
    key
}

fn apply(interactor: &RecordingInteractor, state: ServiceState, event: CallEvent) -> ServiceState {
    let processor = state.action_processor;
    processor.handle(interactor, state, event)
}

fn apply_all(
    interactor: &RecordingInteractor,
    state: ServiceState,
    events: impl IntoIterator<Item = CallEvent>,
) -> ServiceState {
    events
        .into_iter()
        .fold(state, |state, event| apply(interactor, state, event))
}

fn offer_event(call_id: u64, opaque: Option<Vec<u8>>, offer_type: OfferType) -> CallEvent {
    CallEvent::ReceivedOffer {
        call_metadata: CallMetadata::new(peer(call_id), 2),
        offer_metadata: OfferMetadata {
            opaque,
            sdp: None,
            offer_type,
        },
        received_offer_metadata: ReceivedOfferMetadata {
            remote_identity_key: serialized_key(0x22),
            server_received_timestamp: 10_000,
            server_delivered_timestamp: 13_500,
            is_multi_ring: true,
        },
    }
}

/// Drives an outgoing call with id 7 up to the connected phase.
fn connected_outgoing_call(interactor: &RecordingInteractor) -> ServiceState {
    interactor.engine.set_next_call_id(7);
    let state = apply(
        interactor,
        ServiceState::default(),
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Audio,
        },
    );
    let active = state.call_info.active_peer.clone().expect("active peer");
    apply_all(
        interactor,
        state,
        [
            CallEvent::StartOutgoingCall {
                remote_peer: active.clone(),
            },
            CallEvent::RemoteRinging {
                remote_peer: active.clone(),
            },
            CallEvent::CallConnected {
                remote_peer: active,
            },
        ],
    )
}

/// One instance of every event that no shared handler reacts to.
fn phase_specific_events() -> Vec<CallEvent> {
    vec![
        CallEvent::PreJoinCall { recipient: alice() },
        CallEvent::CancelPreJoinCall,
        CallEvent::SetRingGroup { ring_group: true },
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Audio,
        },
        CallEvent::StartOutgoingCall {
            remote_peer: peer(3),
        },
        CallEvent::RemoteRinging {
            remote_peer: peer(3),
        },
        CallEvent::ReceivedAnswer {
            call_metadata: CallMetadata::new(peer(3), 2),
            answer_metadata: AnswerMetadata {
                opaque: Some(vec![1]),
                sdp: None,
            },
            received_answer_metadata: ReceivedAnswerMetadata {
                remote_identity_key: serialized_key(0x22),
                is_multi_ring: true,
            },
        },
        CallEvent::ReceivedBusy {
            call_metadata: CallMetadata::new(peer(3), 2),
        },
        CallEvent::StartIncomingCall {
            remote_peer: peer(3),
        },
        CallEvent::LocalRinging {
            remote_peer: peer(3),
        },
        CallEvent::AcceptCall {
            answer_with_video: false,
        },
        CallEvent::DenyCall,
        CallEvent::CallConnected {
            remote_peer: peer(3),
        },
        CallEvent::ReceivedOfferWhileActive {
            remote_peer: peer(4),
        },
        CallEvent::CallConcluded {
            remote_peer: Some(peer(3)),
        },
        CallEvent::RemoteVideoEnable { enable: true },
        CallEvent::ScreenSharingEnable { enable: true },
        CallEvent::LocalHangup,
        CallEvent::AudioDeviceChanged {
            active_device: AudioDevice::Speakerphone,
            available_devices: vec![AudioDevice::Speakerphone],
        },
        CallEvent::SetUserAudioDevice {
            device: AudioDevice::Earpiece,
        },
        CallEvent::SetEnableVideo { enable: true },
        CallEvent::SetMuteAudio { muted: true },
        CallEvent::SetCameraFlip,
        CallEvent::CameraSwitchCompleted {
            camera_state: CameraState::new(CameraDirection::Back, 2),
        },
        CallEvent::NetworkChanged { available: false },
        CallEvent::EndedRemote {
            event: EndedRemoteEvent::Hangup,
            remote_peer: peer(3),
        },
        CallEvent::Ended {
            event: EndedEvent::Timeout,
            remote_peer: peer(3),
        },
        CallEvent::SetupFailure {
            call_id: CallId::new(3),
        },
        CallEvent::GroupLocalDeviceStateChanged {
            connection_state: GroupConnectionState::Connected,
            join_state: GroupJoinState::Joined,
        },
        CallEvent::GroupRemoteDeviceStateChanged { devices: vec![] },
        CallEvent::GroupJoinedMembershipChanged,
        CallEvent::GroupCallEnded {
            group_call: GroupCallHandle { client_id: 1 },
            reason: GroupCallEndReason::Timeout,
        },
        CallEvent::GroupMessageSentError {
            recipients: vec![RecipientId::new("alice")],
            error_call_state: ViewState::NetworkFailure,
        },
    ]
}

fn is_local_device_event(event: &CallEvent) -> bool {
    matches!(
        event,
        CallEvent::SetEnableVideo { .. }
            | CallEvent::SetMuteAudio { .. }
            | CallEvent::SetCameraFlip
            | CallEvent::CameraSwitchCompleted { .. }
            | CallEvent::AudioDeviceChanged { .. }
            | CallEvent::SetUserAudioDevice { .. }
    )
}

fn is_active_call_event(event: &CallEvent) -> bool {
    matches!(
        event,
        CallEvent::ReceivedOfferWhileActive { .. }
            | CallEvent::LocalHangup
            | CallEvent::CallConcluded { .. }
            | CallEvent::EndedRemote { .. }
            | CallEvent::Ended { .. }
            | CallEvent::SetupFailure { .. }
            | CallEvent::RemoteVideoEnable { .. }
            | CallEvent::ScreenSharingEnable { .. }
    )
}

fn is_group_call_event(event: &CallEvent) -> bool {
    matches!(
        event,
        CallEvent::GroupRemoteDeviceStateChanged { .. }
            | CallEvent::LocalHangup
            | CallEvent::GroupCallEnded { .. }
            | CallEvent::GroupLocalDeviceStateChanged { .. }
    )
}

/// Whether `phase` has its own handler for `event`.
fn reacts_to(phase: ActionProcessor, event: &CallEvent) -> bool {
    match phase {
        ActionProcessor::Idle => matches!(
            event,
            CallEvent::PreJoinCall { .. }
                | CallEvent::OutgoingCall { .. }
                | CallEvent::StartIncomingCall { .. }
        ),
        ActionProcessor::PreJoin { group } => {
            matches!(
                event,
                CallEvent::CancelPreJoinCall
                    | CallEvent::OutgoingCall { .. }
                    | CallEvent::SetRingGroup { .. }
            ) || (group
                && matches!(
                    event,
                    CallEvent::GroupLocalDeviceStateChanged { .. }
                        | CallEvent::GroupRemoteDeviceStateChanged { .. }
                ))
                || is_local_device_event(event)
        }
        ActionProcessor::Outgoing => {
            matches!(
                event,
                CallEvent::StartOutgoingCall { .. }
                    | CallEvent::RemoteRinging { .. }
                    | CallEvent::ReceivedAnswer { .. }
                    | CallEvent::ReceivedBusy { .. }
                    | CallEvent::CallConnected { .. }
            ) || is_active_call_event(event)
                || is_local_device_event(event)
        }
        ActionProcessor::Incoming => {
            matches!(
                event,
                CallEvent::StartIncomingCall { .. }
                    | CallEvent::LocalRinging { .. }
                    | CallEvent::AcceptCall { .. }
                    | CallEvent::DenyCall
                    | CallEvent::CallConnected { .. }
            ) || is_active_call_event(event)
        }
        ActionProcessor::Connected => is_active_call_event(event) || is_local_device_event(event),
        ActionProcessor::GroupJoining => is_group_call_event(event) || is_local_device_event(event),
        ActionProcessor::GroupConnected => {
            matches!(
                event,
                CallEvent::GroupJoinedMembershipChanged | CallEvent::GroupMessageSentError { .. }
            ) || is_group_call_event(event)
                || is_local_device_event(event)
        }
        ActionProcessor::Disconnecting => matches!(
            event,
            CallEvent::CallConcluded { .. } | CallEvent::StartIncomingCall { .. }
        ),
    }
}

#[test]
fn test_unhandled_event_leaves_every_phase_untouched() {
    init_logger();

    let phases = [
        ActionProcessor::Idle,
        ActionProcessor::PreJoin { group: false },
        ActionProcessor::PreJoin { group: true },
        ActionProcessor::Outgoing,
        ActionProcessor::Incoming,
        ActionProcessor::Connected,
        ActionProcessor::GroupJoining,
        ActionProcessor::GroupConnected,
        ActionProcessor::Disconnecting,
    ];

    for phase in phases {
        let unhandled: Vec<CallEvent> = phase_specific_events()
            .into_iter()
            .filter(|event| !reacts_to(phase, event))
            .collect();
        assert!(!unhandled.is_empty(), "{phase:?} handles everything");

        for event in unhandled {
            let interactor = RecordingInteractor::new();
            let state = ServiceState::new(phase);
            let name = event.handler_name();

            let next = apply(&interactor, state.clone(), event);

            assert_eq!(next, state, "{phase:?} changed state on {name}");
            assert!(interactor.is_untouched(), "{phase:?} had side effects on {name}");
        }
    }
}

#[test]
fn test_call_progress_without_a_call_is_ignored() {
    init_logger();
    let stray = [
        (ActionProcessor::Idle, CallEvent::ReceivedBusy {
            call_metadata: CallMetadata::new(peer(3), 2),
        }),
        (ActionProcessor::Idle, CallEvent::RemoteRinging {
            remote_peer: peer(3),
        }),
        (ActionProcessor::Idle, CallEvent::AcceptCall {
            answer_with_video: true,
        }),
        (ActionProcessor::Idle, CallEvent::LocalRinging {
            remote_peer: peer(3),
        }),
        (ActionProcessor::Idle, CallEvent::CallConnected {
            remote_peer: peer(3),
        }),
        (ActionProcessor::Connected, CallEvent::CancelPreJoinCall),
    ];

    for (phase, event) in stray {
        let interactor = RecordingInteractor::new();
        let state = ServiceState::new(phase);
        let name = event.handler_name();

        let next = apply(&interactor, state.clone(), event);

        assert_eq!(next, state, "{phase:?} changed state on {name}");
        assert!(interactor.is_untouched(), "{phase:?} had side effects on {name}");
    }
}

#[test]
fn test_terminate_requires_matching_active_peer() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = ServiceState::new(ActionProcessor::Connected).with_call_info(|info| {
        info.set_active_peer(peer(1).connected());
        info.call_state = ViewState::CallConnected;
    });

    let processor = ActionProcessor::Connected;
    assert_eq!(
        processor.terminate(&interactor, state.clone(), Some(&peer(2))),
        state
    );
    assert_eq!(processor.terminate(&interactor, state.clone(), None), state);
    assert!(interactor.is_untouched());

    let idle = ServiceState::default();
    assert_eq!(processor.terminate(&interactor, idle.clone(), Some(&peer(1))), idle);
    assert!(interactor.is_untouched());

    let terminated = processor.terminate(&interactor, state, Some(&peer(1)));
    assert!(terminated.call_info.active_peer.is_none());
    assert_eq!(terminated.action_processor, ActionProcessor::Idle);
    assert_eq!(
        interactor.effects(),
        vec![
            SideEffect::PhoneState(PhoneState::Processing),
            SideEffect::StopAudio {
                play_disconnect_sound: true
            },
            SideEffect::PhoneState(PhoneState::Idle),
            SideEffect::StopForegroundService,
        ]
    );
}

#[test]
fn test_outgoing_call_flow() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.set_next_call_id(7);

    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Video,
        },
    );
    assert_eq!(state.action_processor, ActionProcessor::Outgoing);
    assert_eq!(state.call_info.call_state, ViewState::CallOutgoing);
    assert!(state.call_setup.accept_with_video);
    assert!(state.video.is_initialized());
    let active = state.call_info.active_peer.clone().expect("active peer");
    assert_eq!(active.call_id, CallId::new(7));
    assert_eq!(active.state, PeerCallState::Dialing);
    assert_eq!(state.call_info.remote_participants.len(), 1);

    let state = apply(
        &interactor,
        state,
        CallEvent::StartOutgoingCall {
            remote_peer: active.clone(),
        },
    );
    let effects = interactor.effects();
    assert!(effects.contains(&SideEffect::OutgoingRinger));
    assert!(effects.contains(&SideEffect::Notification(
        CallInProgressKind::OutgoingRinging
    )));

    let state = apply(
        &interactor,
        state,
        CallEvent::RemoteRinging {
            remote_peer: active.clone(),
        },
    );
    assert_eq!(state.call_info.call_state, ViewState::CallRinging);

    let state = apply(
        &interactor,
        state,
        CallEvent::CallConnected {
            remote_peer: active.clone(),
        },
    );
    assert_eq!(state.action_processor, ActionProcessor::Connected);
    assert_eq!(state.call_info.call_state, ViewState::CallConnected);
    assert!(state.call_info.call_connected_time.is_some());

    assert_eq!(
        interactor.engine.calls(),
        vec![
            EngineCall::Call {
                recipient: RecipientId::new("alice"),
                media_type: OfferType::Video,
            },
            EngineCall::Proceed(CallId::new(7)),
            EngineCall::SetVideoEnabled(true),
            EngineCall::SetAudioEnabled(true),
        ]
    );

    interactor.clear();
    let state = apply(&interactor, state, CallEvent::LocalHangup);
    assert_eq!(state.action_processor, ActionProcessor::Disconnecting);
    assert!(state.call_info.active_peer.is_none());
    assert!(state.call_info.peer(CallId::new(7)).is_some());
    assert_eq!(interactor.engine.calls(), vec![EngineCall::Hangup]);
    assert_eq!(
        interactor.effects().first(),
        Some(&SideEffect::StateUpdate(ViewState::CallDisconnected))
    );

    let state = apply(
        &interactor,
        state,
        CallEvent::CallConcluded {
            remote_peer: Some(active),
        },
    );
    assert_eq!(state.action_processor, ActionProcessor::Idle);
    assert!(state.call_info.peer_map.is_empty());
}

#[test]
fn test_untrusted_offer_is_declined() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.set_accept_calls(false);
    let state = ServiceState::default();

    let next = apply(
        &interactor,
        state.clone(),
        offer_event(5, Some(vec![1, 2, 3]), OfferType::Audio),
    );

    assert_eq!(next, state);
    assert_eq!(interactor.missed_calls(), 1);
    assert!(
        !interactor
            .engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::ReceivedOffer(_)))
    );

    let sent = interactor.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_broadcast());
    match &sent[0].body {
        CallMessageBody::Hangup(hangup) => {
            assert_eq!(hangup.call_id, 5);
            assert_eq!(hangup.hangup_type, HangupType::NeedPermission);
        }
        other => panic!("expected hangup, got {other:?}"),
    }
}

#[test]
fn test_offer_while_pstn_busy_sends_busy() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.set_pstn_line_busy(true);

    apply(
        &interactor,
        ServiceState::default(),
        offer_event(5, Some(vec![1]), OfferType::Audio),
    );

    let sent = interactor.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0].body, CallMessageBody::Busy(_)));
    assert_eq!(interactor.missed_calls(), 1);
}

#[test]
fn test_offer_without_opaque_is_hung_up() {
    init_logger();
    let interactor = RecordingInteractor::new();

    apply(
        &interactor,
        ServiceState::default(),
        offer_event(5, None, OfferType::Audio),
    );

    let sent = interactor.sent_messages();
    assert!(matches!(
        &sent[0].body,
        CallMessageBody::Hangup(hangup) if hangup.hangup_type == HangupType::Normal
    ));
    assert_eq!(interactor.missed_calls(), 1);
}

#[test]
fn test_valid_offer_is_forwarded_with_raw_keys() {
    init_logger();
    let interactor = RecordingInteractor::new();

    let state = apply(
        &interactor,
        ServiceState::default(),
        offer_event(5, Some(vec![9, 9]), OfferType::Video),
    );

    assert!(state.call_setup.is_remote_video_offer);
    let stored = state.call_info.peer(CallId::new(5)).expect("peer stored");
    assert_eq!(stored.call_start_timestamp, 10_000);

    let calls = interactor.engine.calls();
    let [EngineCall::ReceivedOffer(offer)] = calls.as_slice() else {
        panic!("expected a single received_offer, got {calls:?}");
    };
    assert_eq!(offer.message_age_secs, 3);
    assert_eq!(offer.sender_identity_key, vec![0x22; 32]);
    assert_eq!(offer.receiver_identity_key, vec![0x11; 32]);
    assert_eq!(offer.remote_device, 2);
    assert_eq!(offer.opaque, vec![9, 9]);
    assert!(offer.is_multi_ring);
    assert_eq!(interactor.missed_calls(), 0);
}

#[test]
fn test_offer_with_bad_identity_key_fails_the_call() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let event = match offer_event(5, Some(vec![1]), OfferType::Audio) {
        CallEvent::ReceivedOffer {
            call_metadata,
            offer_metadata,
            mut received_offer_metadata,
        } => {
            received_offer_metadata.remote_identity_key = vec![0x06, 1, 2];
            CallEvent::ReceivedOffer {
                call_metadata,
                offer_metadata,
                received_offer_metadata,
            }
        }
        other => other,
    };

    let state = apply(&interactor, ServiceState::default(), event);

    assert_eq!(interactor.engine.calls(), vec![EngineCall::Reset]);
    assert!(state.call_info.peer_map.is_empty());
    assert_eq!(state.action_processor, ActionProcessor::Idle);
}

#[test]
fn test_incoming_call_flow() {
    init_logger();
    let interactor = RecordingInteractor::new();

    let state = apply(
        &interactor,
        ServiceState::default(),
        offer_event(5, Some(vec![1]), OfferType::Audio),
    );
    let state = apply(
        &interactor,
        state,
        CallEvent::StartIncomingCall {
            remote_peer: peer(5),
        },
    );
    assert_eq!(state.action_processor, ActionProcessor::Incoming);
    assert_eq!(state.call_info.call_state, ViewState::CallIncoming);
    let active = state.call_info.active_peer.clone().expect("active peer");
    assert_eq!(active.state, PeerCallState::Answering);
    assert_eq!(active.call_start_timestamp, 10_000);

    let state = apply(
        &interactor,
        state,
        CallEvent::LocalRinging {
            remote_peer: peer(5),
        },
    );
    assert_eq!(
        state.call_info.active_peer.as_ref().map(|p| p.state),
        Some(PeerCallState::LocalRinging)
    );
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::IncomingRinger(RecipientId::new("alice")))
    );

    interactor.clear();
    let state = apply_all(
        &interactor,
        state,
        [
            CallEvent::AcceptCall {
                answer_with_video: false,
            },
            CallEvent::CallConnected {
                remote_peer: peer(5),
            },
        ],
    );
    assert_eq!(state.action_processor, ActionProcessor::Connected);
    assert_eq!(
        &interactor.engine.calls()[..2],
        &[
            EngineCall::AcceptCall(CallId::new(5)),
            EngineCall::SetVideoEnabled(false),
        ]
    );
    assert_eq!(interactor.missed_calls(), 0);
}

#[test]
fn test_deny_call_records_missed_call() {
    init_logger();
    let interactor = RecordingInteractor::new();

    let state = apply_all(
        &interactor,
        ServiceState::default(),
        [
            offer_event(5, Some(vec![1]), OfferType::Audio),
            CallEvent::StartIncomingCall {
                remote_peer: peer(5),
            },
            CallEvent::LocalRinging {
                remote_peer: peer(5),
            },
        ],
    );
    interactor.clear();

    let state = apply(&interactor, state, CallEvent::DenyCall);

    assert_eq!(interactor.missed_calls(), 1);
    assert_eq!(interactor.engine.calls(), vec![EngineCall::Hangup]);
    assert_eq!(state.action_processor, ActionProcessor::Disconnecting);
    assert!(state.call_info.active_peer.is_none());
}

#[test]
fn test_busy_after_termination_has_no_effect() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.set_next_call_id(7);

    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Audio,
        },
    );
    let state = apply(
        &interactor,
        state,
        CallEvent::EndedRemote {
            event: EndedRemoteEvent::Busy,
            remote_peer: peer(7),
        },
    );
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::StateUpdate(ViewState::CallBusy))
    );
    assert_eq!(state.action_processor, ActionProcessor::Idle);
    assert!(state.call_info.active_peer.is_none());

    interactor.clear();
    let busy = CallEvent::ReceivedBusy {
        call_metadata: CallMetadata::new(peer(7), 2),
    };
    let after = apply_all(&interactor, state.clone(), [busy.clone(), busy]);

    assert_eq!(after, state);
    assert!(interactor.is_untouched());
}

#[test]
fn test_ended_remote_for_other_peer_only_removes_it() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor)
        .with_call_info(|info| info.put_remote_peer(peer(8).local_ringing()));
    interactor.clear();

    let state = apply(
        &interactor,
        state,
        CallEvent::EndedRemote {
            event: EndedRemoteEvent::Glare,
            remote_peer: peer(8),
        },
    );

    assert_eq!(state.action_processor, ActionProcessor::Connected);
    assert!(state.call_info.peer(CallId::new(8)).is_none());
    assert!(state.call_info.peer(CallId::new(7)).is_some());
    assert_eq!(interactor.missed_calls(), 1);
}

#[test]
fn test_engine_failure_ends_the_call() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.fail_on("proceed");
    interactor.engine.set_next_call_id(7);

    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Audio,
        },
    );
    let state = apply(
        &interactor,
        state,
        CallEvent::StartOutgoingCall {
            remote_peer: peer(7),
        },
    );

    assert_eq!(state.action_processor, ActionProcessor::Disconnecting);
    assert!(state.call_info.peer_map.is_empty());
    assert!(state.call_info.active_peer.is_none());
    assert!(interactor.engine.calls().contains(&EngineCall::Reset));
}

#[test]
fn test_untrusted_identity_on_send_is_attached_to_participant() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.set_next_call_id(7);
    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::OutgoingCall {
            recipient: alice(),
            offer_type: OfferType::Audio,
        },
    );

    let state = apply(
        &interactor,
        state,
        CallEvent::MessageSentError {
            call_id: CallId::new(7),
            error_call_state: ViewState::UntrustedIdentity,
            identity_key: Some(vec![4, 2]),
        },
    );

    assert_eq!(state.call_info.call_state, ViewState::UntrustedIdentity);
    let participant = state
        .call_info
        .remote_participant(&RecipientId::new("alice"))
        .expect("participant");
    assert_eq!(participant.identity_key, Some(vec![4, 2]));
    assert!(
        interactor
            .engine
            .calls()
            .contains(&EngineCall::MessageSendFailure(CallId::new(7)))
    );
}

#[test]
fn test_offer_while_active_is_missed() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor)
        .with_call_info(|info| info.put_remote_peer(peer(9)));
    interactor.clear();

    let state = apply(
        &interactor,
        state,
        CallEvent::ReceivedOfferWhileActive {
            remote_peer: peer(9),
        },
    );

    assert!(state.call_info.peer(CallId::new(9)).is_none());
    assert_eq!(state.action_processor, ActionProcessor::Connected);
    assert_eq!(interactor.missed_calls(), 1);
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::Notification(CallInProgressKind::Established))
    );
}

#[test]
fn test_disconnecting_hands_new_incoming_call_to_idle() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = ServiceState::new(ActionProcessor::Disconnecting)
        .with_call_info(|info| info.put_remote_peer(peer(3)));

    let state = apply(
        &interactor,
        state,
        CallEvent::StartIncomingCall {
            remote_peer: peer(3),
        },
    );

    assert_eq!(state.action_processor, ActionProcessor::Incoming);
    assert_eq!(
        state.call_info.active_peer.as_ref().map(|p| p.call_id),
        Some(CallId::new(3))
    );
    assert!(
        interactor
            .engine
            .calls()
            .contains(&EngineCall::Proceed(CallId::new(3)))
    );
}

#[test]
fn test_orientation_with_landscape_ignores_device_rotation() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor);
    let sink = state.video.local_sink.clone().expect("local sink");
    interactor.clear();

    let state = apply(
        &interactor,
        state,
        CallEvent::OrientationChanged {
            landscape_enabled: true,
            orientation_degrees: 90,
        },
    );

    assert_eq!(
        sink.device_orientation_degrees(),
        BroadcastVideoSink::DEVICE_ROTATION_IGNORE
    );
    assert_eq!(state.local_device.orientation, Orientation::Portrait);
    assert_eq!(
        state.local_device.device_orientation,
        Orientation::LandscapeLeftEdge
    );
    assert!(state.local_device.landscape_enabled);
    assert_eq!(interactor.effects(), vec![SideEffect::CameraOrientation(90)]);
}

#[test]
fn test_group_call_flow() {
    init_logger();
    let interactor = RecordingInteractor::new();

    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::PreJoinCall { recipient: group() },
    );
    assert_eq!(state.action_processor, ActionProcessor::PreJoin { group: true });
    assert_eq!(state.call_info.call_state, ViewState::CallPreJoin);
    let handle = state.call_info.group_call.expect("group call");

    let state = apply_all(
        &interactor,
        state,
        [
            CallEvent::GroupLocalDeviceStateChanged {
                connection_state: GroupConnectionState::Connected,
                join_state: GroupJoinState::NotJoined,
            },
            CallEvent::OutgoingCall {
                recipient: group(),
                offer_type: OfferType::Video,
            },
        ],
    );
    assert_eq!(state.action_processor, ActionProcessor::GroupJoining);
    assert_eq!(
        state.call_info.group_call_state,
        GroupCallState::ConnectedAndJoining
    );
    let calls = interactor.engine.calls();
    assert!(calls.contains(&EngineCall::JoinGroupCall(handle)));
    assert!(calls.contains(&EngineCall::RingGroup(handle)));

    let state = apply(
        &interactor,
        state,
        CallEvent::GroupLocalDeviceStateChanged {
            connection_state: GroupConnectionState::Connected,
            join_state: GroupJoinState::Joined,
        },
    );
    assert_eq!(state.action_processor, ActionProcessor::GroupConnected);
    assert_eq!(state.call_info.call_state, ViewState::CallConnected);
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::SendGroupCallMessage(RecipientId::new("friends")))
    );

    let devices = vec![
        GroupRemoteDevice {
            demux_id: 10,
            recipient: alice(),
            audio_muted: Some(false),
            video_muted: Some(true),
            presenting: false,
        },
        GroupRemoteDevice {
            demux_id: 20,
            recipient: Recipient::individual("bob"),
            audio_muted: None,
            video_muted: Some(false),
            presenting: true,
        },
    ];
    let state = apply(
        &interactor,
        state,
        CallEvent::GroupRemoteDeviceStateChanged {
            devices: devices.clone(),
        },
    );
    assert_eq!(state.call_info.remote_participants.len(), 2);
    let bob = &state.call_info.remote_participants[1];
    assert!(bob.video_enabled);
    assert!(bob.screen_sharing);
    assert!(!bob.microphone_enabled);
    let bob_sink = bob.video_sink.clone();

    let state = apply(
        &interactor,
        state,
        CallEvent::GroupRemoteDeviceStateChanged {
            devices: devices[1..].to_vec(),
        },
    );
    assert_eq!(state.call_info.remote_participants.len(), 1);
    assert_eq!(state.call_info.remote_participants[0].video_sink, bob_sink);

    interactor.clear();
    let state = apply(&interactor, state, CallEvent::LocalHangup);
    assert_eq!(state, ServiceState::new(ActionProcessor::Idle));
    assert_eq!(
        interactor.engine.calls(),
        vec![EngineCall::DisconnectGroupCall(handle)]
    );
    let effects = interactor.effects();
    assert_eq!(
        effects[..2],
        [
            SideEffect::SendGroupCallMessage(RecipientId::new("friends")),
            SideEffect::StateUpdate(ViewState::CallDisconnected),
        ]
    );
}

#[test]
fn test_group_call_end_for_other_call_is_ignored() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = ServiceState::new(ActionProcessor::GroupConnected).with_call_info(|info| {
        info.group_call = Some(GroupCallHandle { client_id: 1 });
        info.call_state = ViewState::CallConnected;
    });

    let unchanged = apply(
        &interactor,
        state.clone(),
        CallEvent::GroupCallEnded {
            group_call: GroupCallHandle { client_id: 2 },
            reason: GroupCallEndReason::Timeout,
        },
    );
    assert_eq!(unchanged, state);
    assert!(interactor.is_untouched());

    let ended = apply(
        &interactor,
        state,
        CallEvent::GroupCallEnded {
            group_call: GroupCallHandle { client_id: 1 },
            reason: GroupCallEndReason::ServerExplicitlyDisconnected,
        },
    );
    assert_eq!(ended, ServiceState::new(ActionProcessor::Idle));
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::StateUpdate(ViewState::CallDisconnected))
    );
}

#[test]
fn test_cancel_group_pre_join_disconnects() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::PreJoinCall { recipient: group() },
    );
    let handle = state.call_info.group_call.expect("group call");

    let state = apply(&interactor, state, CallEvent::CancelPreJoinCall);

    assert_eq!(state, ServiceState::new(ActionProcessor::Idle));
    assert!(
        interactor
            .engine
            .calls()
            .contains(&EngineCall::DisconnectGroupCall(handle))
    );
}

#[test]
fn test_failed_group_connect_resets_to_idle() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.fail_on("connect_group_call");

    let state = apply(
        &interactor,
        ServiceState::default(),
        CallEvent::PreJoinCall { recipient: group() },
    );

    assert_eq!(state, ServiceState::new(ActionProcessor::Idle));
    assert!(interactor.engine.calls().contains(&EngineCall::Reset));
    assert!(
        interactor
            .effects()
            .contains(&SideEffect::StateUpdate(ViewState::CallDisconnected))
    );
}

fn ring_update(ring_id: i64, ring_update: RingUpdate) -> CallEvent {
    CallEvent::GroupCallRingUpdate {
        group: group(),
        group_id: GroupId::new(vec![0xca, 0xfe]),
        ring_id,
        sender: RecipientId::new("bob"),
        ring_update,
    }
}

#[test]
fn test_idle_rings_each_request_once() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = ServiceState::default();

    let state = apply(&interactor, state, ring_update(42, RingUpdate::Requested));
    assert_eq!(
        interactor.effects(),
        vec![
            SideEffect::GroupRingUpdated {
                ring_id: 42,
                ring_update: RingUpdate::Requested,
            },
            SideEffect::GroupRinging {
                ring_id: 42,
                sender: RecipientId::new("bob"),
            },
        ]
    );

    interactor.clear();
    let state = apply(&interactor, state, ring_update(42, RingUpdate::Requested));
    assert!(interactor.is_untouched());

    apply(
        &interactor,
        state,
        ring_update(42, RingUpdate::CancelledByRinger),
    );
    assert_eq!(
        interactor.effects(),
        vec![SideEffect::GroupRingUpdated {
            ring_id: 42,
            ring_update: RingUpdate::CancelledByRinger,
        }]
    );
}

#[test]
fn test_busy_device_declines_group_ring() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor);
    interactor.clear();

    let state = apply(&interactor, state, ring_update(42, RingUpdate::Requested));
    assert_eq!(
        interactor.engine.calls(),
        vec![EngineCall::CancelGroupRing {
            group_id: GroupId::new(vec![0xca, 0xfe]),
            ring_id: 42,
            reason: RingCancelReason::Busy,
        }]
    );
    assert_eq!(
        interactor.effects(),
        vec![SideEffect::GroupRingUpdated {
            ring_id: 42,
            ring_update: RingUpdate::BusyLocally,
        }]
    );

    interactor.clear();
    apply(
        &interactor,
        state,
        ring_update(43, RingUpdate::BusyOnAnotherDevice),
    );
    assert!(interactor.engine.calls().is_empty());
    assert_eq!(
        interactor.effects(),
        vec![SideEffect::GroupRingUpdated {
            ring_id: 43,
            ring_update: RingUpdate::BusyOnAnotherDevice,
        }]
    );
}

#[test]
fn test_failed_ring_cancel_is_not_persisted() {
    init_logger();
    let interactor = RecordingInteractor::new();
    interactor.engine.fail_on("cancel_group_ring");
    let state = ServiceState::new(ActionProcessor::Connected);

    let next = apply(&interactor, state.clone(), ring_update(42, RingUpdate::Requested));

    assert_eq!(next, state);
    assert!(interactor.effects().is_empty());
}

#[test]
fn test_camera_toggle_while_connected() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor);
    interactor.clear();

    let state = apply(&interactor, state, CallEvent::SetEnableVideo { enable: true });

    assert!(state.local_device.camera_state.is_enabled());
    assert_eq!(
        interactor.engine.calls(),
        vec![EngineCall::SetVideoEnabled(true)]
    );
    assert_eq!(
        interactor.effects(),
        vec![SideEffect::PhoneState(PhoneState::InVideo)]
    );

    let state = apply(&interactor, state, CallEvent::SetMuteAudio { muted: true });
    assert!(!state.local_device.microphone_enabled);
    assert_eq!(
        interactor.engine.calls().last(),
        Some(&EngineCall::SetAudioEnabled(false))
    );
}

#[test]
fn test_ice_candidates_are_batched_and_empty_batches_dropped() {
    init_logger();
    let interactor = RecordingInteractor::new();
    let state = connected_outgoing_call(&interactor);
    interactor.clear();

    let send = |candidates: Vec<Vec<u8>>| CallEvent::SendIceCandidates {
        call_metadata: CallMetadata::new(peer(7), 2),
        broadcast: false,
        ice_candidates: candidates,
    };

    let state = apply(&interactor, state, send(vec![]));
    assert!(interactor.is_untouched());

    apply(&interactor, state, send(vec![vec![1], vec![2]]));
    let sent = interactor.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].call_id(), Some(CallId::new(7)));
    assert_eq!(sent[0].destination_device_id, Some(2));
    match &sent[0].body {
        CallMessageBody::IceUpdate(updates) => assert_eq!(updates.len(), 2),
        other => panic!("expected ice update, got {other:?}"),
    }
}
