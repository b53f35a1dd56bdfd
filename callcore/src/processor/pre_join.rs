//! The call screen is up but nobody has been dialed or joined yet.

use super::{ActionProcessor, Processor, group, idle, local_device};
use crate::event::CallEvent;
use crate::state::ServiceState;
use crate::types::{GroupCallState, PhoneState, ViewState};
use log::{info, warn};

pub(super) fn handle(
    p: &Processor<'_>,
    group: bool,
    state: ServiceState,
    event: CallEvent,
) -> ServiceState {
    match event {
        CallEvent::CancelPreJoinCall => cancel_pre_join_call(p, group, state),
        CallEvent::OutgoingCall {
            recipient,
            offer_type,
        } => {
            if group {
                join_group_call(p, state)
            } else {
                idle::begin_call(p, state, recipient, offer_type)
            }
        }
        CallEvent::SetRingGroup { ring_group } => {
            info!(target: p.tag, "handle_set_ring_group(): {ring_group}");
            state.with_call_setup(|setup| setup.ring_group = ring_group)
        }
        CallEvent::GroupLocalDeviceStateChanged {
            connection_state,
            join_state,
        } if group => {
            let group_call_state = group::group_call_state(connection_state, join_state);
            info!(
                target: p.tag,
                "handle_group_local_device_state_changed(): {connection_state:?} {join_state:?} -> {group_call_state:?}"
            );
            state.with_call_info(|info| info.group_call_state = group_call_state)
        }
        CallEvent::GroupRemoteDeviceStateChanged { devices } if group => {
            group::update_remote_devices(p, state, devices)
        }
        other => local_device::handle(p, state, other),
    }
}

fn cancel_pre_join_call(p: &Processor<'_>, group: bool, state: ServiceState) -> ServiceState {
    info!(target: p.tag, "handle_cancel_pre_join_call():");

    if group
        && let Some(group_call) = state.call_info.group_call
        && let Err(e) = p.engine().disconnect_group_call(group_call)
    {
        warn!(target: p.tag, "Unable to disconnect group call: {e}");
    }

    ServiceState::new(ActionProcessor::Idle)
}

fn join_group_call(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let Some(group_call) = state.call_info.group_call else {
        warn!(target: p.tag, "No group call to join");
        return state;
    };

    info!(target: p.tag, "handle_outgoing_call(): joining group call {}", group_call.client_id);

    let engine = p.engine();
    if let Err(e) = engine.join_group_call(group_call) {
        return p.group_call_failure(state, "Unable to join group call", &e);
    }

    let audio_muted = !state.local_device.microphone_enabled;
    let video_muted = !state.local_device.camera_state.is_enabled();
    if let Err(e) = engine
        .set_group_outgoing_audio_muted(group_call, audio_muted)
        .and_then(|()| engine.set_group_outgoing_video_muted(group_call, video_muted))
    {
        warn!(target: p.tag, "Unable to apply outgoing mute state: {e}");
    }

    if state.call_setup.ring_group
        && let Err(e) = engine.ring_group(group_call)
    {
        warn!(target: p.tag, "Unable to ring group: {e}");
    }

    p.interactor.update_phone_state(PhoneState::InCall);

    state
        .with_call_info(|info| {
            info.call_state = ViewState::CallOutgoing;
            info.group_call_state = GroupCallState::ConnectedAndJoining;
        })
        .with_processor(ActionProcessor::GroupJoining)
}
