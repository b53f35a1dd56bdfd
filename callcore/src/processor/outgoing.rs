//! We placed a 1:1 call and wait for the callee.

use super::{Processor, active, local_device};
use crate::error::CallError;
use crate::event::CallEvent;
use crate::identity::public_key_bytes;
use crate::state::ServiceState;
use crate::types::{
    AnswerMetadata, CallInProgressKind, CallMetadata, PhoneState, ReceivedAnswerMetadata,
    RemotePeer, ViewState,
};
use log::{info, warn};

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::StartOutgoingCall { remote_peer } => start_outgoing_call(p, state, &remote_peer),
        CallEvent::RemoteRinging { remote_peer } => remote_ringing(p, state, &remote_peer),
        CallEvent::ReceivedAnswer {
            call_metadata,
            answer_metadata,
            received_answer_metadata,
        } => received_answer(
            p,
            state,
            &call_metadata,
            answer_metadata,
            &received_answer_metadata,
        ),
        CallEvent::ReceivedBusy { call_metadata } => received_busy(p, state, &call_metadata),
        CallEvent::CallConnected { remote_peer } => {
            active::call_connected(p, state, &remote_peer)
        }
        other => active::handle(p, state, other, local_device::handle),
    }
}

fn start_outgoing_call(
    p: &Processor<'_>,
    state: ServiceState,
    remote_peer: &RemotePeer,
) -> ServiceState {
    info!(target: p.tag, "handle_start_outgoing_call(): call_id: {}", remote_peer.call_id);

    let active_peer = match state.call_info.require_active_peer() {
        Ok(active_peer) if active_peer.call_id_equals(Some(remote_peer)) => active_peer.clone(),
        Ok(_) => {
            warn!(target: p.tag, "Received call start for non-active call");
            return state;
        }
        Err(e) => {
            warn!(target: p.tag, "Received call start without a call: {e}");
            return state;
        }
    };

    let active_peer = active_peer.dialing();
    let recipient = active_peer.recipient.clone();
    let state = state.with_call_info(|info| info.put_remote_peer(active_peer.clone()));

    p.interactor.update_phone_state(PhoneState::InCall);
    p.interactor.start_outgoing_ringer();
    p.interactor
        .set_call_in_progress_notification(CallInProgressKind::OutgoingRinging, &recipient);

    match p
        .engine()
        .proceed(active_peer.call_id, p.interactor.bandwidth_mode())
    {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "Unable to proceed with call", &e),
    }
}

fn remote_ringing(p: &Processor<'_>, state: ServiceState, remote_peer: &RemotePeer) -> ServiceState {
    info!(target: p.tag, "handle_remote_ringing(): call_id: {}", remote_peer.call_id);

    let Some(active_peer) = state
        .call_info
        .active_peer
        .clone()
        .filter(|active| active.call_id_equals(Some(remote_peer)))
    else {
        warn!(target: p.tag, "Ringing for non-active call {}", remote_peer.call_id);
        return state;
    };

    state.with_call_info(|info| {
        info.put_remote_peer(active_peer.remote_ringing());
        info.call_state = ViewState::CallRinging;
    })
}

fn received_answer(
    p: &Processor<'_>,
    state: ServiceState,
    call_metadata: &CallMetadata,
    answer_metadata: AnswerMetadata,
    received: &ReceivedAnswerMetadata,
) -> ServiceState {
    info!(target: p.tag, "handle_received_answer(): id: {}", call_metadata.format());

    let Some(opaque) = answer_metadata.opaque else {
        return p.call_failure(state, "receivedAnswer() failed", &"answer is missing opaque data");
    };

    match forward_answer(p, call_metadata, &opaque, received) {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "receivedAnswer() failed", &e),
    }
}

fn forward_answer(
    p: &Processor<'_>,
    call_metadata: &CallMetadata,
    opaque: &[u8],
    received: &ReceivedAnswerMetadata,
) -> Result<(), CallError> {
    let remote_identity_key = public_key_bytes(&received.remote_identity_key)?;
    let local_identity_key = public_key_bytes(&p.interactor.local_identity_key())?;

    p.engine().received_answer(
        call_metadata.call_id(),
        call_metadata.remote_device,
        opaque,
        received.is_multi_ring,
        &remote_identity_key,
        &local_identity_key,
    )?;
    Ok(())
}

fn received_busy(p: &Processor<'_>, state: ServiceState, call_metadata: &CallMetadata) -> ServiceState {
    info!(target: p.tag, "handle_received_busy(): id: {}", call_metadata.format());

    match p
        .engine()
        .received_busy(call_metadata.call_id(), call_metadata.remote_device)
    {
        Ok(()) => state,
        Err(e) => p.call_failure(state, "receivedBusy() failed", &e),
    }
}
