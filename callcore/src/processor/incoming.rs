//! A 1:1 call offered to us, ringing until answered or declined.

use super::{Processor, active, base};
use crate::event::CallEvent;
use crate::state::ServiceState;
use crate::types::{
    BroadcastVideoSink, CallInProgressKind, CallParticipant, CallParticipantId, PhoneState,
    RemotePeer, ViewState,
};
use log::{info, warn};

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::StartIncomingCall { remote_peer } => start_incoming_call(p, state, remote_peer),
        CallEvent::LocalRinging { remote_peer } => local_ringing(p, state, &remote_peer),
        CallEvent::AcceptCall { answer_with_video } => accept_call(p, state, answer_with_video),
        CallEvent::DenyCall => deny_call(p, state),
        CallEvent::CallConnected { remote_peer } => {
            active::call_connected(p, state, &remote_peer)
        }
        other => active::handle(p, state, other, base::handle),
    }
}

fn start_incoming_call(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: RemotePeer,
) -> ServiceState {
    info!(target: p.tag, "handle_start_incoming_call(): call_id: {}", remote_peer.call_id);

    let remote_peer = state
        .call_info
        .peer(remote_peer.call_id)
        .cloned()
        .unwrap_or(remote_peer)
        .answering();
    let recipient = remote_peer.recipient.clone();
    let participant = CallParticipant::create_remote(
        CallParticipantId::for_recipient(recipient.id.clone()),
        recipient.clone(),
        BroadcastVideoSink::new(),
        state.call_setup.is_remote_video_offer,
        true,
    );

    let state = state.with_call_info(|info| {
        info.set_active_peer(remote_peer.clone());
        info.call_state = ViewState::CallIncoming;
        info.call_recipient = Some(recipient.clone());
        info.clear_participants();
        info.put_participant(participant);
    });

    p.interactor
        .set_call_in_progress_notification(CallInProgressKind::IncomingConnecting, &recipient);

    match p
        .engine()
        .proceed(remote_peer.call_id, p.interactor.bandwidth_mode())
    {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "Unable to proceed with incoming call", &e),
    }
}

fn local_ringing(p: &Processor<'_>, state: ServiceState, remote_peer: &RemotePeer) -> ServiceState {
    info!(target: p.tag, "handle_local_ringing(): call_id: {}", remote_peer.call_id);

    let Some(active_peer) = state
        .call_info
        .active_peer
        .clone()
        .filter(|active| active.call_id_equals(Some(remote_peer)))
    else {
        warn!(target: p.tag, "Ringing for non-active call {}", remote_peer.call_id);
        return state;
    };

    let active_peer = active_peer.local_ringing();
    p.interactor.update_phone_state(PhoneState::Interactive);
    p.interactor
        .start_incoming_ringer(&active_peer.recipient, true);
    p.interactor.set_call_in_progress_notification(
        CallInProgressKind::IncomingRinging,
        &active_peer.recipient,
    );

    state.with_call_info(|info| {
        info.put_remote_peer(active_peer);
        info.call_state = ViewState::CallIncoming;
    })
}

fn accept_call(p: &Processor<'_>, state: ServiceState, answer_with_video: bool) -> ServiceState {
    let Some(active_peer) = state.call_info.active_peer.clone() else {
        warn!(target: p.tag, "No active peer to accept");
        return state;
    };

    info!(
        target: p.tag,
        "handle_accept_call(): call_id: {} video: {answer_with_video}",
        active_peer.call_id
    );

    let state = state.with_call_setup(|setup| setup.accept_with_video = answer_with_video);
    p.interactor.stop_audio(false);

    let engine = p.engine();
    match engine
        .accept_call(active_peer.call_id)
        .and_then(|()| engine.set_video_enabled(answer_with_video))
    {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "accept_call() failed", &e),
    }
}

fn deny_call(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let Some(active_peer) = state.call_info.active_peer.clone() else {
        warn!(target: p.tag, "No active peer to deny");
        return state;
    };

    info!(target: p.tag, "handle_deny_call(): call_id: {}", active_peer.call_id);

    if let Err(e) = p.engine().hangup() {
        return p.call_failure(state, "hangup() failed", &e);
    }

    p.interactor.insert_missed_call(
        &active_peer,
        active_peer.call_start_timestamp,
        state.call_setup.is_remote_video_offer,
    );

    let state = state.with_call_info(|info| info.call_state = ViewState::CallDisconnected);
    p.interactor.post_state_update(&state);

    p.terminate(state, Some(&active_peer))
}
