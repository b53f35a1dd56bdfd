//! No call in progress.

use super::{ActionProcessor, Processor, base};
use crate::engine::EngineResult;
use crate::event::CallEvent;
use crate::state::ServiceState;
use crate::types::{
    BroadcastVideoSink, CallParticipant, CallParticipantId, GroupCallHandle, GroupCallState,
    GroupId, OfferType, Recipient, RecipientId, RemotePeer, RingUpdate, ViewState,
};
use chrono::Utc;
use log::info;

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::PreJoinCall { recipient } => pre_join_call(p, state, recipient),
        CallEvent::OutgoingCall {
            recipient,
            offer_type,
        } => begin_call(p, state, recipient, offer_type),
        event @ CallEvent::StartIncomingCall { .. } => {
            info!(target: p.tag, "handle_start_incoming_call():");
            let state = state
                .with_video_initialized()
                .with_processor(ActionProcessor::Incoming);
            ActionProcessor::Incoming.handle(p.interactor, state, event)
        }
        CallEvent::GroupCallRingUpdate {
            group,
            group_id,
            ring_id,
            sender,
            ring_update,
        } => group_call_ring_update(p, state, &group, &group_id, ring_id, &sender, ring_update),
        other => base::handle(p, state, other),
    }
}

fn pre_join_call(p: &Processor<'_>, state: ServiceState, recipient: Recipient) -> ServiceState {
    info!(target: p.tag, "handle_pre_join_call(): recipient: {}", recipient.id);

    let state = state.with_video_initialized().with_call_info(|info| {
        info.call_state = ViewState::CallPreJoin;
        info.call_recipient = Some(recipient.clone());
    });

    let Some(group_id) = &recipient.group_id else {
        return state.with_processor(ActionProcessor::PreJoin { group: false });
    };

    match connect_group_call(p, group_id) {
        Ok(group_call) => state
            .with_call_info(|info| {
                info.group_call = Some(group_call);
                info.group_call_state = GroupCallState::Disconnected;
            })
            .with_processor(ActionProcessor::PreJoin { group: true }),
        Err(e) => p.group_call_failure(state, "Unable to connect to group call", &e),
    }
}

fn connect_group_call(p: &Processor<'_>, group_id: &GroupId) -> EngineResult<GroupCallHandle> {
    let group_call = p.engine().create_group_call(group_id)?;
    p.engine().connect_group_call(group_call)?;
    Ok(group_call)
}

/// Starts a 1:1 call; shared with the direct pre-join screen.
pub(super) fn begin_call(
    p: &Processor<'_>,
    state: ServiceState,
    recipient: Recipient,
    offer_type: OfferType,
) -> ServiceState {
    info!(target: p.tag, "begin_call(): recipient: {} type: {offer_type:?}", recipient.id);

    let state = state.with_video_initialized();

    let call_id = match p
        .engine()
        .call(&recipient.id, offer_type, p.interactor.local_device_id())
    {
        Ok(call_id) => call_id,
        Err(e) => return p.call_failure(state, "Unable to create outgoing call", &e),
    };

    let remote_peer = RemotePeer::new(recipient.clone(), call_id)
        .with_call_start_timestamp(Utc::now().timestamp_millis())
        .dialing();
    let participant = CallParticipant::create_remote(
        CallParticipantId::for_recipient(recipient.id.clone()),
        recipient.clone(),
        BroadcastVideoSink::new(),
        false,
        true,
    );

    state
        .with_call_info(|info| {
            info.call_state = ViewState::CallOutgoing;
            info.call_recipient = Some(recipient);
            info.set_active_peer(remote_peer);
            info.clear_participants();
            info.put_participant(participant);
        })
        .with_call_setup(|setup| setup.accept_with_video = offer_type.is_video())
        .with_processor(ActionProcessor::Outgoing)
}

fn group_call_ring_update(
    p: &Processor<'_>,
    state: ServiceState,
    group: &Recipient,
    group_id: &GroupId,
    ring_id: i64,
    sender: &RecipientId,
    ring_update: RingUpdate,
) -> ServiceState {
    info!(
        target: p.tag,
        "handle_group_call_ring_update(): group: {group_id} ring: {ring_id} sender: {sender} update: {ring_update:?}"
    );

    let now = Utc::now().timestamp_millis();

    if ring_update != RingUpdate::Requested {
        p.interactor
            .insert_or_update_group_ring(ring_id, now, ring_update);
        return state;
    }

    if let Some(existing) = p.interactor.group_ring(ring_id) {
        info!(
            target: p.tag,
            "ring {ring_id} already handled ({:?}), ignoring",
            existing.ring_update
        );
        return state;
    }

    p.interactor
        .insert_or_update_group_ring(ring_id, now, RingUpdate::Requested);
    p.interactor.start_group_ringing(group, ring_id, sender);

    state
}
