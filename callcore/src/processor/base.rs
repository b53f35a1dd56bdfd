//! Handlers shared by every phase.

use super::Processor;
use crate::engine::IncomingOffer;
use crate::error::CallError;
use crate::event::CallEvent;
use crate::identity::public_key_bytes;
use crate::messages::{
    AnswerMessage, BusyMessage, CallMessage, HangupMessage, IceUpdateMessage, OfferMessage,
    OpaqueMessage,
};
use crate::state::ServiceState;
use crate::types::{
    AnswerMetadata, BroadcastVideoSink, CallId, CallMetadata, GroupId, HangupMetadata, HangupType,
    OfferMetadata, OfferType, OpaqueMessageMetadata, Orientation, ReceivedOfferMetadata, Recipient,
    RemotePeer, RingCancelReason, RingUpdate, ViewState,
};
use chrono::Utc;
use log::{debug, info, warn};

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::SendOffer {
            call_metadata,
            offer_metadata,
            broadcast,
        } => send_offer(p, state, &call_metadata, offer_metadata, broadcast),
        CallEvent::SendAnswer {
            call_metadata,
            answer_metadata,
            broadcast,
        } => send_answer(p, state, &call_metadata, answer_metadata, broadcast),
        CallEvent::SendBusy {
            call_metadata,
            broadcast,
        } => send_busy(p, state, &call_metadata, broadcast),
        CallEvent::SendHangup {
            call_metadata,
            hangup_metadata,
            broadcast,
        } => send_hangup(p, state, &call_metadata, hangup_metadata, broadcast),
        CallEvent::SendIceCandidates {
            call_metadata,
            broadcast,
            ice_candidates,
        } => send_ice_candidates(p, state, &call_metadata, broadcast, ice_candidates),
        CallEvent::SendOpaqueMessage {
            recipient,
            opaque,
            urgent,
        } => send_opaque_message(p, state, &recipient, opaque, urgent),
        CallEvent::ReceivedOffer {
            call_metadata,
            offer_metadata,
            received_offer_metadata,
        } => received_offer(
            p,
            state,
            call_metadata,
            offer_metadata,
            received_offer_metadata,
        ),
        CallEvent::ReceivedOfferExpired { remote_peer } => {
            received_offer_expired(p, state, remote_peer)
        }
        CallEvent::ReceivedHangup {
            call_metadata,
            hangup_metadata,
        } => received_hangup(p, state, &call_metadata, hangup_metadata),
        CallEvent::ReceivedIceCandidates {
            call_metadata,
            ice_candidates,
        } => received_ice_candidates(p, state, &call_metadata, &ice_candidates),
        CallEvent::MessageSentSuccess { call_id } => message_sent_success(p, state, call_id),
        CallEvent::MessageSentError {
            call_id,
            error_call_state,
            identity_key,
        } => message_sent_error(p, state, call_id, error_call_state, identity_key),
        CallEvent::BandwidthModeUpdate => bandwidth_mode_update(p, state),
        CallEvent::OrientationChanged {
            landscape_enabled,
            orientation_degrees,
        } => orientation_changed(p, state, landscape_enabled, orientation_degrees),
        CallEvent::ReceivedOpaqueMessage { metadata } => {
            received_opaque_message(p, state, &metadata)
        }
        CallEvent::GroupCallRingUpdate {
            group_id,
            ring_id,
            ring_update,
            ..
        } => {
            info!(
                target: p.tag,
                "handle_group_call_ring_update(): group: {group_id} ring: {ring_id} update: {ring_update:?}"
            );
            reject_group_ring(p, &group_id, ring_id, ring_update);
            state
        }
        other => p.not_processed(state, &other),
    }
}

fn destination(call_metadata: &CallMetadata, broadcast: bool) -> Option<u32> {
    (!broadcast).then_some(call_metadata.remote_device)
}

fn send_offer(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    offer_metadata: OfferMetadata,
    broadcast: bool,
) -> ServiceState {
    info!(target: p.tag, "handle_send_offer(): id: {}", call_metadata.format());

    let offer = OfferMessage {
        call_id: call_metadata.call_id().as_u64(),
        sdp: offer_metadata.sdp,
        offer_type: offer_metadata.offer_type,
        opaque: offer_metadata.opaque,
    };
    let message = CallMessage::for_offer(offer, true, destination(call_metadata, broadcast));
    p.interactor
        .send_call_message(&call_metadata.remote_peer.recipient, message);

    state
}

fn send_answer(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    answer_metadata: AnswerMetadata,
    broadcast: bool,
) -> ServiceState {
    info!(target: p.tag, "handle_send_answer(): id: {}", call_metadata.format());

    let answer = AnswerMessage {
        call_id: call_metadata.call_id().as_u64(),
        sdp: answer_metadata.sdp,
        opaque: answer_metadata.opaque,
    };
    let message = CallMessage::for_answer(answer, true, destination(call_metadata, broadcast));
    p.interactor
        .send_call_message(&call_metadata.remote_peer.recipient, message);

    state
}

pub(super) fn send_busy(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    broadcast: bool,
) -> ServiceState {
    info!(target: p.tag, "handle_send_busy(): id: {}", call_metadata.format());

    let busy = BusyMessage {
        call_id: call_metadata.call_id().as_u64(),
    };
    let message = CallMessage::for_busy(busy, true, destination(call_metadata, broadcast));
    p.interactor
        .send_call_message(&call_metadata.remote_peer.recipient, message);

    state
}

pub(super) fn send_hangup(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    hangup_metadata: HangupMetadata,
    broadcast: bool,
) -> ServiceState {
    info!(target: p.tag, "handle_send_hangup(): id: {}", call_metadata.format());

    let hangup = HangupMessage {
        call_id: call_metadata.call_id().as_u64(),
        hangup_type: hangup_metadata.hangup_type,
        device_id: hangup_metadata.device_id,
        legacy: hangup_metadata.is_legacy,
    };
    let message = CallMessage::for_hangup(hangup, true, destination(call_metadata, broadcast));
    p.interactor
        .send_call_message(&call_metadata.remote_peer.recipient, message);

    state
}

fn send_ice_candidates(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    broadcast: bool,
    ice_candidates: Vec<Vec<u8>>,
) -> ServiceState {
    info!(target: p.tag, "handle_send_ice_candidates(): id: {}", call_metadata.format());

    if ice_candidates.is_empty() {
        debug!(target: p.tag, "no ice candidates to send");
        return state;
    }

    let call_id = call_metadata.call_id();
    let updates = ice_candidates
        .into_iter()
        .map(|opaque| IceUpdateMessage {
            call_id: call_id.as_u64(),
            opaque,
        })
        .collect();
    let message = CallMessage::for_ice_updates(
        call_id,
        updates,
        true,
        destination(call_metadata, broadcast),
    );
    p.interactor
        .send_call_message(&call_metadata.remote_peer.recipient, message);

    state
}

fn send_opaque_message(
    p: &Processor<'_>,
    state: ServiceState,
    recipient: &Recipient,
    opaque: Vec<u8>,
    urgent: bool,
) -> ServiceState {
    info!(target: p.tag, "handle_send_opaque_message(): recipient: {}", recipient.id);

    let message = CallMessage::for_opaque(OpaqueMessage { opaque, urgent });
    p.interactor.send_call_message(recipient, message);

    state
}

fn received_offer(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: CallMetadata,
    offer_metadata: OfferMetadata,
    received: ReceivedOfferMetadata,
) -> ServiceState {
    info!(target: p.tag, "handle_received_offer(): id: {}", call_metadata.format());

    let offer_type = offer_metadata.offer_type;
    let is_video_offer = offer_type.is_video();
    let insert_missed_call = || {
        p.interactor.insert_missed_call(
            &call_metadata.remote_peer,
            received.server_received_timestamp,
            is_video_offer,
        )
    };

    if p.interactor.is_any_pstn_line_busy() {
        info!(target: p.tag, "PSTN line is busy.");
        let state = send_busy(p, state, &call_metadata, true);
        insert_missed_call();
        return state;
    }

    if !p
        .interactor
        .is_call_request_accepted(&call_metadata.remote_peer.recipient)
    {
        warn!(target: p.tag, "Caller is untrusted.");
        let hangup = HangupMetadata::from_type(HangupType::NeedPermission);
        let state = send_hangup(p, state, &call_metadata, hangup, true);
        insert_missed_call();
        return state;
    }

    let Some(opaque) = offer_metadata.opaque else {
        warn!(target: p.tag, "Opaque data is required.");
        let hangup = HangupMetadata::from_type(HangupType::Normal);
        let state = send_hangup(p, state, &call_metadata, hangup, true);
        insert_missed_call();
        return state;
    };

    let remote_peer = call_metadata
        .remote_peer
        .clone()
        .with_call_start_timestamp(received.server_received_timestamp);
    info!(target: p.tag, "add remote peer call_id: {}", remote_peer.call_id);

    let state = state
        .with_call_setup(|setup| setup.is_remote_video_offer = is_video_offer)
        .with_call_info(|info| info.put_remote_peer(remote_peer.clone()));

    let message_age_secs = received.message_age_secs();
    info!(
        target: p.tag,
        "message_age_secs: {message_age_secs}, server_received_timestamp: {}, server_delivered_timestamp: {}",
        received.server_received_timestamp, received.server_delivered_timestamp
    );

    let forwarded = incoming_offer(
        p,
        &call_metadata,
        remote_peer,
        opaque,
        message_age_secs,
        offer_type,
        &received,
    )
    .and_then(|offer| {
        p.engine()
            .received_offer(&offer)
            .map_err(CallError::from)
    });

    match forwarded {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "Unable to process received offer", &e),
    }
}

fn incoming_offer(
    p: &Processor<'_>,
    call_metadata: &CallMetadata,
    remote_peer: RemotePeer,
    opaque: Vec<u8>,
    message_age_secs: u64,
    offer_type: OfferType,
    received: &ReceivedOfferMetadata,
) -> Result<IncomingOffer, CallError> {
    Ok(IncomingOffer {
        call_id: call_metadata.call_id(),
        remote_peer,
        remote_device: call_metadata.remote_device,
        opaque,
        message_age_secs,
        media_type: offer_type,
        local_device: p.interactor.local_device_id(),
        is_multi_ring: received.is_multi_ring,
        sender_identity_key: public_key_bytes(&received.remote_identity_key)?,
        receiver_identity_key: public_key_bytes(&p.interactor.local_identity_key())?,
    })
}

fn received_offer_expired(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: RemotePeer,
) -> ServiceState {
    info!(target: p.tag, "handle_received_offer_expired(): call_id: {}", remote_peer.call_id);

    let call_start_timestamp = state
        .call_info
        .peer(remote_peer.call_id)
        .map_or(remote_peer.call_start_timestamp, |peer| {
            peer.call_start_timestamp
        });
    p.interactor.insert_missed_call(
        &remote_peer,
        call_start_timestamp,
        state.call_setup.is_remote_video_offer,
    );

    p.terminate(state, Some(&remote_peer))
}

fn received_hangup(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    hangup_metadata: HangupMetadata,
) -> ServiceState {
    info!(target: p.tag, "handle_received_hangup(): id: {}", call_metadata.format());

    match p.engine().received_hangup(
        call_metadata.call_id(),
        call_metadata.remote_device,
        hangup_metadata.hangup_type,
        hangup_metadata.device_id,
    ) {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "received_hangup() failed", &e),
    }
}

fn received_ice_candidates(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    ice_candidates: &[Vec<u8>],
) -> ServiceState {
    info!(
        target: p.tag,
        "handle_received_ice_candidates(): id: {}, count: {}",
        call_metadata.format(),
        ice_candidates.len()
    );

    match p.engine().received_ice_candidates(
        call_metadata.call_id(),
        call_metadata.remote_device,
        ice_candidates,
    ) {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "received_ice_candidates() failed", &e),
    }
}

fn message_sent_success(p: &Processor<'_>, state: ServiceState, call_id: CallId) -> ServiceState {
    match p.engine().message_sent(call_id) {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "engine.message_sent() failed", &e),
    }
}

fn message_sent_error(
    p: &Processor<'_>,
    state: ServiceState,
    call_id: CallId,
    error_call_state: ViewState,
    identity_key: Option<Vec<u8>>,
) -> ServiceState {
    warn!(target: p.tag, "handle_message_sent_error(): call_id: {call_id} state: {error_call_state:?}");

    let state = match p.engine().message_send_failure(call_id) {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "engine.message_send_failure() failed", &e),
    };

    let Some(active_peer) = state.call_info.active_peer.clone() else {
        return state;
    };

    state.with_call_info(|info| {
        info.call_state = error_call_state;
        if error_call_state == ViewState::UntrustedIdentity
            && let Some(participant) = info.remote_participant(&active_peer.recipient.id).cloned()
        {
            info.put_participant(participant.with_identity_key(identity_key));
        }
    })
}

fn bandwidth_mode_update(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    if let Err(e) = p
        .engine()
        .update_bandwidth_mode(p.interactor.bandwidth_mode())
    {
        info!(target: p.tag, "handle_bandwidth_mode_update: could not update bandwidth mode: {e}");
    }
    state
}

fn orientation_changed(
    p: &Processor<'_>,
    state: ServiceState,
    landscape_enabled: bool,
    orientation_degrees: i32,
) -> ServiceState {
    if state.video.camera.is_some() {
        p.interactor.set_camera_orientation(orientation_degrees);
    }

    let (sink_rotation, state_rotation) = if landscape_enabled {
        (BroadcastVideoSink::DEVICE_ROTATION_IGNORE, 0)
    } else {
        (orientation_degrees, orientation_degrees)
    };

    if let Some(sink) = &state.video.local_sink {
        sink.set_device_orientation_degrees(sink_rotation);
    }
    for participant in &state.call_info.remote_participants {
        participant
            .video_sink
            .set_device_orientation_degrees(sink_rotation);
    }

    state.with_local_device(|device| {
        device.orientation = Orientation::from_degrees(state_rotation);
        device.landscape_enabled = landscape_enabled;
        device.device_orientation = Orientation::from_degrees(orientation_degrees);
    })
}

fn received_opaque_message(
    p: &Processor<'_>,
    state: ServiceState,
    metadata: &OpaqueMessageMetadata,
) -> ServiceState {
    info!(target: p.tag, "handle_received_opaque_message(): sender: {}", metadata.sender);

    match p.engine().received_call_message(
        &metadata.sender,
        metadata.remote_device_id,
        p.interactor.local_device_id(),
        &metadata.opaque,
        metadata.message_age_seconds,
    ) {
        Ok(()) => state,
        Err(e) => p.group_call_failure(state, "Unable to receive opaque message", &e),
    }
}

/// Declines a ring because this device is busy and records it so a repeat is not rung again.
pub(super) fn reject_group_ring(
    p: &Processor<'_>,
    group_id: &GroupId,
    ring_id: i64,
    ring_update: RingUpdate,
) {
    if !ring_update.is_busy()
        && let Err(e) = p
            .engine()
            .cancel_group_ring(group_id, ring_id, RingCancelReason::Busy)
    {
        warn!(target: p.tag, "Unable to cancel ring: {e}");
        return;
    }

    let persisted = match ring_update {
        RingUpdate::Requested => RingUpdate::BusyLocally,
        other => other,
    };
    p.interactor
        .insert_or_update_group_ring(ring_id, Utc::now().timestamp_millis(), persisted);
}
