//! The call state machine.
//!
//! One [`ActionProcessor`] variant per call phase. Each phase handles the
//! events that mean something to it and falls through to the shared handlers
//! in [`base`]; anything left over is logged and ignored, since duplicate and
//! out-of-order signaling is expected from the network.

mod active;
mod base;
mod connected;
mod disconnecting;
mod group;
mod idle;
mod incoming;
mod local_device;
mod outgoing;
mod pre_join;

use crate::engine::CallEngine;
use crate::event::CallEvent;
use crate::interactor::CallInteractor;
use crate::state::ServiceState;
use crate::types::{GroupCallState, PhoneState, RemotePeer, ViewState};
use log::{info, warn};
use std::fmt::Display;

/// The phase a call is in; decides which handler an event reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionProcessor {
    #[default]
    Idle,
    PreJoin {
        group: bool,
    },
    Outgoing,
    Incoming,
    Connected,
    GroupJoining,
    GroupConnected,
    Disconnecting,
}

impl ActionProcessor {
    /// Log target of this phase.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "callcore::processor::idle",
            Self::PreJoin { group: false } => "callcore::processor::pre_join",
            Self::PreJoin { group: true } => "callcore::processor::group_pre_join",
            Self::Outgoing => "callcore::processor::outgoing",
            Self::Incoming => "callcore::processor::incoming",
            Self::Connected => "callcore::processor::connected",
            Self::GroupJoining => "callcore::processor::group_joining",
            Self::GroupConnected => "callcore::processor::group_connected",
            Self::Disconnecting => "callcore::processor::disconnecting",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(
            self,
            Self::PreJoin { group: true } | Self::GroupJoining | Self::GroupConnected
        )
    }

    /// Applies `event` to `state` and returns the next state.
    ///
    /// Never fails: engine errors end the call through [`Self::call_failure`],
    /// events that do not apply to this phase leave the state untouched.
    pub fn handle(
        &self,
        interactor: &dyn CallInteractor,
        state: ServiceState,
        event: CallEvent,
    ) -> ServiceState {
        let processor = Processor::new(*self, interactor);
        match self {
            Self::Idle => idle::handle(&processor, state, event),
            Self::PreJoin { group } => pre_join::handle(&processor, *group, state, event),
            Self::Outgoing => outgoing::handle(&processor, state, event),
            Self::Incoming => incoming::handle(&processor, state, event),
            Self::Connected => connected::handle(&processor, state, event),
            Self::GroupJoining => group::handle_joining(&processor, state, event),
            Self::GroupConnected => group::handle_connected(&processor, state, event),
            Self::Disconnecting => disconnecting::handle(&processor, state, event),
        }
    }

    /// Ends the current call after a local error.
    pub fn call_failure(
        &self,
        interactor: &dyn CallInteractor,
        state: ServiceState,
        message: &str,
        error: &dyn Display,
    ) -> ServiceState {
        Processor::new(*self, interactor).call_failure(state, message, error)
    }

    /// Tears down the call if `remote_peer` is the active peer; otherwise a no-op.
    pub fn terminate(
        &self,
        interactor: &dyn CallInteractor,
        state: ServiceState,
        remote_peer: Option<&RemotePeer>,
    ) -> ServiceState {
        Processor::new(*self, interactor).terminate(state, remote_peer)
    }
}

/// A phase bound to the capabilities it may use while handling one event.
pub(crate) struct Processor<'a> {
    phase: ActionProcessor,
    tag: &'static str,
    interactor: &'a dyn CallInteractor,
}

impl<'a> Processor<'a> {
    fn new(phase: ActionProcessor, interactor: &'a dyn CallInteractor) -> Self {
        Self {
            phase,
            tag: phase.tag(),
            interactor,
        }
    }

    fn engine(&self) -> &'a dyn CallEngine {
        self.interactor.engine()
    }

    /// The shared fallback for events this phase does not handle.
    fn not_processed(&self, state: ServiceState, event: &CallEvent) -> ServiceState {
        info!(target: self.tag, "{} not processed", event.handler_name());
        state
    }

    fn call_failure(
        &self,
        state: ServiceState,
        message: &str,
        error: &dyn Display,
    ) -> ServiceState {
        warn!(target: self.tag, "call_failure(): {message}: {error}");

        let had_active_peer = state.call_info.active_peer.is_some();

        if let Err(e) = self.engine().reset() {
            warn!(target: self.tag, "Unable to reset call engine: {e}");
        }

        let state = state.with_call_info(|info| {
            if had_active_peer {
                info.call_state = ViewState::CallDisconnected;
            }
            info.clear_peer_map();
        });

        let active_peer = state.call_info.active_peer.clone();
        self.terminate(state, active_peer.as_ref())
    }

    fn terminate(&self, state: ServiceState, remote_peer: Option<&RemotePeer>) -> ServiceState {
        info!(target: self.tag, "terminate():");

        let Some(active_peer) = &state.call_info.active_peer else {
            info!(target: self.tag, "skipping with no active peer");
            return state;
        };

        if !active_peer.call_id_equals(remote_peer) {
            info!(target: self.tag, "skipping remote peer is not active peer");
            return state;
        }

        self.interactor.update_phone_state(PhoneState::Processing);
        self.interactor
            .stop_audio(active_peer.plays_disconnect_sound());
        self.interactor.update_phone_state(PhoneState::Idle);
        self.interactor.stop_foreground_service();

        let next = if state.call_info.call_state == ViewState::CallDisconnected {
            ActionProcessor::Disconnecting
        } else {
            ActionProcessor::Idle
        };
        state.terminated(next)
    }

    fn group_call_failure(
        &self,
        state: ServiceState,
        message: &str,
        error: &dyn Display,
    ) -> ServiceState {
        warn!(target: self.tag, "group_call_failure(): {message}: {error}");

        let group_call = state.call_info.group_call;

        if let Some(recipient) = &state.call_info.call_recipient
            && state.call_info.group_call_state.is_connected()
        {
            self.interactor.send_group_call_message(recipient);
        }

        let state = state.with_call_info(|info| {
            info.call_state = ViewState::CallDisconnected;
            info.group_call_state = GroupCallState::Disconnected;
        });
        self.interactor.post_state_update(&state);

        if let Some(group_call) = group_call
            && let Err(e) = self.engine().disconnect_group_call(group_call)
        {
            warn!(target: self.tag, "Unable to disconnect group call: {e}");
        }
        if let Err(e) = self.engine().reset() {
            warn!(target: self.tag, "Unable to reset call engine: {e}");
        }

        self.terminate_group_call(state)
    }

    fn terminate_group_call(&self, state: ServiceState) -> ServiceState {
        self.interactor.update_phone_state(PhoneState::Processing);
        self.interactor
            .stop_audio(state.call_info.call_state == ViewState::CallDisconnected);
        self.interactor.update_phone_state(PhoneState::Idle);
        self.interactor.stop_foreground_service();

        ServiceState::new(ActionProcessor::Idle)
    }
}

#[cfg(test)]
mod tests;
