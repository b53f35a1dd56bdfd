//! Handlers shared by the phases that hold a 1:1 active peer.

use super::{ActionProcessor, Processor};
use crate::event::{CallEvent, EndedEvent, EndedRemoteEvent};
use crate::state::ServiceState;
use crate::types::{
    CallId, CallInProgressKind, CallParticipant, PeerCallState, PhoneState, RemotePeer, ViewState,
};
use chrono::Utc;
use log::{info, warn};

type Fallback = fn(&Processor<'_>, ServiceState, CallEvent) -> ServiceState;

pub(super) fn handle(
    p: &Processor<'_>,
    state: ServiceState,
    event: CallEvent,
    fallback: Fallback,
) -> ServiceState {
    match event {
        CallEvent::ReceivedOfferWhileActive { remote_peer } => {
            received_offer_while_active(p, state, &remote_peer)
        }
        CallEvent::LocalHangup => local_hangup(p, state),
        CallEvent::CallConcluded { remote_peer } => call_concluded(p, state, remote_peer.as_ref()),
        CallEvent::EndedRemote { event, remote_peer } => ended_remote(p, state, event, remote_peer),
        CallEvent::Ended { event, remote_peer } => ended(p, state, event, remote_peer),
        CallEvent::SetupFailure { call_id } => setup_failure(p, state, call_id),
        CallEvent::RemoteVideoEnable { enable } => {
            update_active_participant(p, state, |participant| participant.video_enabled = enable)
        }
        CallEvent::ScreenSharingEnable { enable } => {
            update_active_participant(p, state, |participant| participant.screen_sharing = enable)
        }
        other => fallback(p, state, other),
    }
}

/// Moves the active call to [`ActionProcessor::Connected`].
pub(super) fn call_connected(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: &RemotePeer,
) -> ServiceState {
    info!(target: p.tag, "handle_call_connected(): call_id: {}", remote_peer.call_id);

    let Some(active_peer) = state
        .call_info
        .active_peer
        .clone()
        .filter(|active| active.call_id_equals(Some(remote_peer)))
    else {
        warn!(target: p.tag, "Connected event for non-active call {}", remote_peer.call_id);
        return state;
    };

    let active_peer = active_peer.connected();
    let recipient = active_peer.recipient.clone();
    let enable_video =
        state.call_setup.accept_with_video || state.local_device.camera_state.is_enabled();
    let microphone_enabled = state.local_device.microphone_enabled;

    let state = state
        .with_call_info(|info| {
            info.put_remote_peer(active_peer);
            info.call_state = ViewState::CallConnected;
            info.call_connected_time = Some(Utc::now().timestamp_millis());
        })
        .with_processor(ActionProcessor::Connected);

    p.interactor.stop_audio(false);
    p.interactor.update_phone_state(if enable_video {
        PhoneState::InVideo
    } else {
        PhoneState::InCall
    });
    p.interactor
        .set_call_in_progress_notification(CallInProgressKind::Established, &recipient);

    let engine = p.engine();
    match engine
        .set_video_enabled(enable_video)
        .and_then(|()| engine.set_audio_enabled(microphone_enabled))
    {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "Enabling audio/video failed", &e),
    }
}

fn received_offer_while_active(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: &RemotePeer,
) -> ServiceState {
    info!(target: p.tag, "handle_received_offer_while_active(): call_id: {}", remote_peer.call_id);

    let Some(active_peer) = &state.call_info.active_peer else {
        warn!(target: p.tag, "No active peer while handling offer");
        return state;
    };

    let kind = match active_peer.state {
        PeerCallState::Dialing | PeerCallState::RemoteRinging => {
            Some(CallInProgressKind::OutgoingRinging)
        }
        PeerCallState::Idle | PeerCallState::Answering => {
            Some(CallInProgressKind::IncomingConnecting)
        }
        PeerCallState::LocalRinging => Some(CallInProgressKind::IncomingRinging),
        PeerCallState::Connected => Some(CallInProgressKind::Established),
        PeerCallState::Terminated | PeerCallState::ReceivedBusy => None,
    };

    match kind {
        Some(kind) => p
            .interactor
            .set_call_in_progress_notification(kind, &active_peer.recipient),
        None => warn!(target: p.tag, "Unexpected active peer state {:?}", active_peer.state),
    }

    let call_start_timestamp = state
        .call_info
        .peer(remote_peer.call_id)
        .map_or(remote_peer.call_start_timestamp, |peer| peer.call_start_timestamp);
    p.interactor.insert_missed_call(
        remote_peer,
        call_start_timestamp,
        state.call_setup.is_remote_video_offer,
    );

    state.with_call_info(|info| info.remove_remote_peer(remote_peer))
}

pub(super) fn local_hangup(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let Some(active_peer) = state.call_info.active_peer.clone() else {
        info!(target: p.tag, "No active peer to hang up");
        return state;
    };

    info!(target: p.tag, "handle_local_hangup(): call_id: {}", active_peer.call_id);

    if let Err(e) = p.engine().hangup() {
        return p.call_failure(state, "hangup() failed", &e);
    }

    let state = state.with_call_info(|info| info.call_state = ViewState::CallDisconnected);
    p.interactor.post_state_update(&state);

    p.terminate(state, Some(&active_peer))
}

fn call_concluded(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: Option<&RemotePeer>,
) -> ServiceState {
    let Some(remote_peer) = remote_peer else {
        info!(target: p.tag, "handle_call_concluded(): no peer");
        return state;
    };

    info!(target: p.tag, "handle_call_concluded(): call_id: {}", remote_peer.call_id);
    state.with_call_info(|info| info.remove_remote_peer(remote_peer))
}

fn ended_remote(
    p: &Processor<'_>,
    state: ServiceState,
    event: EndedRemoteEvent,
    remote_peer: RemotePeer,
) -> ServiceState {
    info!(
        target: p.tag,
        "handle_ended_remote(): call_id: {} action: {event:?}",
        remote_peer.call_id
    );

    let remote_peer = state
        .call_info
        .peer(remote_peer.call_id)
        .cloned()
        .unwrap_or(remote_peer);
    let is_active = remote_peer.call_id_equals(state.call_info.active_peer.as_ref());
    let incoming_before_accept = matches!(
        remote_peer.state,
        PeerCallState::Answering | PeerCallState::LocalRinging
    );

    if incoming_before_accept
        && !matches!(
            event,
            EndedRemoteEvent::HangupAccepted | EndedRemoteEvent::Busy
        )
    {
        p.interactor.insert_missed_call(
            &remote_peer,
            remote_peer.call_start_timestamp,
            state.call_setup.is_remote_video_offer,
        );
    }

    if !is_active {
        return state.with_call_info(|info| info.remove_remote_peer(&remote_peer));
    }

    let remote_peer = if event == EndedRemoteEvent::Busy {
        remote_peer.received_busy()
    } else {
        remote_peer
    };

    let state = state.with_call_info(|info| {
        info.put_remote_peer(remote_peer.clone());
        info.call_state = event.view_state();
    });
    p.interactor.post_state_update(&state);

    p.terminate(state, Some(&remote_peer))
}

fn ended(
    p: &Processor<'_>,
    state: ServiceState,
    event: EndedEvent,
    remote_peer: RemotePeer,
) -> ServiceState {
    warn!(
        target: p.tag,
        "handle_ended(): call_id: {} action: {event:?}",
        remote_peer.call_id
    );

    let remote_peer = state
        .call_info
        .peer(remote_peer.call_id)
        .cloned()
        .unwrap_or(remote_peer);

    if !remote_peer.call_id_equals(state.call_info.active_peer.as_ref()) {
        return state.with_call_info(|info| info.remove_remote_peer(&remote_peer));
    }

    if matches!(
        remote_peer.state,
        PeerCallState::Answering | PeerCallState::LocalRinging
    ) {
        p.interactor.insert_missed_call(
            &remote_peer,
            remote_peer.call_start_timestamp,
            state.call_setup.is_remote_video_offer,
        );
    }

    let state = state.with_call_info(|info| info.call_state = event.view_state());
    p.interactor.post_state_update(&state);

    p.terminate(state, Some(&remote_peer))
}

fn setup_failure(p: &Processor<'_>, state: ServiceState, call_id: CallId) -> ServiceState {
    info!(target: p.tag, "handle_setup_failure(): call_id: {call_id}");

    let Some(active_peer) = state
        .call_info
        .active_peer
        .clone()
        .filter(|active| active.call_id == call_id)
    else {
        return state.with_call_info(|info| {
            info.peer_map.remove(&call_id);
        });
    };

    if let Err(e) = p.engine().reset() {
        warn!(target: p.tag, "Unable to reset call engine: {e}");
    }

    p.terminate(state, Some(&active_peer))
}

fn update_active_participant(
    p: &Processor<'_>,
    state: ServiceState,
    change: impl FnOnce(&mut CallParticipant),
) -> ServiceState {
    let Some(active_peer) = state.call_info.active_peer.clone() else {
        warn!(target: p.tag, "No active peer to update");
        return state;
    };

    let Some(mut participant) = state
        .call_info
        .remote_participant(&active_peer.recipient.id)
        .cloned()
    else {
        warn!(target: p.tag, "No participant for active peer {}", active_peer.recipient.id);
        return state;
    };

    change(&mut participant);
    state.with_call_info(|info| info.put_participant(participant))
}
