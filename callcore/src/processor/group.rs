//! Joining and taking part in a group call.

use super::{ActionProcessor, Processor, local_device};
use crate::event::CallEvent;
use crate::state::ServiceState;
use crate::types::{
    CallInProgressKind, CallParticipant, CallParticipantId, GroupCallEndReason, GroupCallHandle,
    GroupCallState, GroupConnectionState, GroupJoinState, GroupRemoteDevice, PhoneState,
    RecipientId, ViewState,
};
use chrono::Utc;
use log::{info, warn};

pub(super) fn handle_joining(
    p: &Processor<'_>,
    state: ServiceState,
    event: CallEvent,
) -> ServiceState {
    match event {
        CallEvent::GroupLocalDeviceStateChanged {
            connection_state,
            join_state,
        } => {
            let group_call_state = group_call_state(connection_state, join_state);
            info!(
                target: p.tag,
                "handle_group_local_device_state_changed(): {connection_state:?} {join_state:?} -> {group_call_state:?}"
            );
            if group_call_state == GroupCallState::ConnectedAndJoined {
                joined(p, state)
            } else {
                state.with_call_info(|info| info.group_call_state = group_call_state)
            }
        }
        other => handle_in_call(p, state, other),
    }
}

pub(super) fn handle_connected(
    p: &Processor<'_>,
    state: ServiceState,
    event: CallEvent,
) -> ServiceState {
    match event {
        CallEvent::GroupLocalDeviceStateChanged {
            connection_state,
            join_state,
        } => {
            let group_call_state = group_call_state(connection_state, join_state);
            info!(
                target: p.tag,
                "handle_group_local_device_state_changed(): {connection_state:?} {join_state:?} -> {group_call_state:?}"
            );
            match group_call_state {
                GroupCallState::ConnectedAndJoined | GroupCallState::Reconnecting => {
                    state.with_call_info(|info| info.group_call_state = group_call_state)
                }
                _ => dropped(p, state),
            }
        }
        CallEvent::GroupJoinedMembershipChanged => {
            info!(target: p.tag, "handle_group_joined_membership_changed():");
            state
        }
        CallEvent::GroupMessageSentError {
            recipients,
            error_call_state,
        } => group_message_sent_error(p, state, &recipients, error_call_state),
        other => handle_in_call(p, state, other),
    }
}

/// Handlers shared by the joining and connected phases.
fn handle_in_call(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::GroupRemoteDeviceStateChanged { devices } => {
            update_remote_devices(p, state, devices)
        }
        CallEvent::LocalHangup => local_hangup(p, state),
        CallEvent::GroupCallEnded { group_call, reason } => {
            group_call_ended(p, state, group_call, reason)
        }
        other => local_device::handle(p, state, other),
    }
}

/// Collapses the engine's connection and join states into one view state.
pub(super) fn group_call_state(
    connection_state: GroupConnectionState,
    join_state: GroupJoinState,
) -> GroupCallState {
    match connection_state {
        GroupConnectionState::NotConnected => GroupCallState::Disconnected,
        GroupConnectionState::Connecting => GroupCallState::Connecting,
        GroupConnectionState::Reconnecting => GroupCallState::Reconnecting,
        GroupConnectionState::Connected => match join_state {
            GroupJoinState::Joined => GroupCallState::ConnectedAndJoined,
            GroupJoinState::Joining | GroupJoinState::Pending => {
                GroupCallState::ConnectedAndJoining
            }
            GroupJoinState::NotJoined => GroupCallState::Connected,
        },
    }
}

/// Replaces the remote participants with `devices`, keeping each device's sink.
pub(super) fn update_remote_devices(
    p: &Processor<'_>,
    state: ServiceState,
    devices: Vec<GroupRemoteDevice>,
) -> ServiceState {
    info!(
        target: p.tag,
        "handle_group_remote_device_state_changed(): {} devices",
        devices.len()
    );

    let participants: Vec<CallParticipant> = devices
        .into_iter()
        .map(|device| {
            let id = CallParticipantId {
                demux_id: device.demux_id,
                recipient: device.recipient.id.clone(),
            };
            let video_sink = state
                .call_info
                .remote_participants
                .iter()
                .find(|existing| existing.id == id)
                .map(|existing| existing.video_sink.clone())
                .unwrap_or_default();
            CallParticipant::create_remote(
                id,
                device.recipient,
                video_sink,
                device.video_muted == Some(false),
                device.audio_muted == Some(false),
            )
            .with_screen_sharing(device.presenting)
        })
        .collect();

    state.with_call_info(|info| info.remote_participants = participants)
}

fn joined(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let state = state
        .with_call_info(|info| {
            info.call_state = ViewState::CallConnected;
            info.group_call_state = GroupCallState::ConnectedAndJoined;
            info.call_connected_time = Some(Utc::now().timestamp_millis());
        })
        .with_processor(ActionProcessor::GroupConnected);

    if let Some(recipient) = &state.call_info.call_recipient {
        p.interactor.send_group_call_message(recipient);
        p.interactor
            .set_call_in_progress_notification(CallInProgressKind::Established, recipient);
    }
    p.interactor.update_phone_state(PhoneState::InCall);

    state
}

fn dropped(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    warn!(target: p.tag, "Lost connection to group call");

    let state = state.with_call_info(|info| {
        info.call_state = ViewState::CallDisconnected;
        info.group_call_state = GroupCallState::Disconnected;
    });
    p.interactor.post_state_update(&state);

    p.terminate_group_call(state)
}

fn local_hangup(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let Some(group_call) = state.call_info.group_call else {
        info!(target: p.tag, "No group call to hang up");
        return state;
    };

    info!(target: p.tag, "handle_local_hangup(): group call {}", group_call.client_id);

    if let Err(e) = p.engine().disconnect_group_call(group_call) {
        return p.group_call_failure(state, "Unable to disconnect from group call", &e);
    }

    if let Some(recipient) = &state.call_info.call_recipient
        && state.call_info.group_call_state.is_connected()
    {
        p.interactor.send_group_call_message(recipient);
    }

    let state = state.with_call_info(|info| {
        info.call_state = ViewState::CallDisconnected;
        info.group_call_state = GroupCallState::Disconnected;
    });
    p.interactor.post_state_update(&state);

    p.terminate_group_call(state)
}

fn group_call_ended(
    p: &Processor<'_>,
    state: ServiceState,
    group_call: GroupCallHandle,
    reason: GroupCallEndReason,
) -> ServiceState {
    if state.call_info.group_call != Some(group_call) {
        info!(
            target: p.tag,
            "handle_group_call_ended(): ignoring end of unknown group call {}",
            group_call.client_id
        );
        return state;
    }

    info!(target: p.tag, "handle_group_call_ended(): reason: {reason:?}");

    let state = state.with_call_info(|info| {
        info.call_state = ViewState::CallDisconnected;
        info.group_call_state = GroupCallState::Disconnected;
    });
    p.interactor.post_state_update(&state);

    p.terminate_group_call(state)
}

fn group_message_sent_error(
    p: &Processor<'_>,
    state: ServiceState,
    recipients: &[RecipientId],
    error_call_state: ViewState,
) -> ServiceState {
    warn!(
        target: p.tag,
        "handle_group_message_sent_error(): {error_call_state:?} for {} recipients",
        recipients.len()
    );

    if error_call_state == ViewState::UntrustedIdentity {
        state.with_call_info(|info| info.call_state = ViewState::UntrustedIdentity)
    } else {
        state
    }
}
