//! A 1:1 call we hung up, waiting for the engine to conclude it.

use super::{ActionProcessor, Processor, base};
use crate::event::CallEvent;
use crate::state::ServiceState;
use log::info;

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::CallConcluded { remote_peer } => {
            info!(
                target: p.tag,
                "handle_call_concluded(): call_id: {:?}",
                remote_peer.as_ref().map(|peer| peer.call_id)
            );
            state
                .with_call_info(|info| {
                    if let Some(remote_peer) = &remote_peer {
                        info.remove_remote_peer(remote_peer);
                    }
                })
                .with_processor(ActionProcessor::Idle)
        }
        event @ CallEvent::StartIncomingCall { .. } => {
            info!(target: p.tag, "handle_start_incoming_call(): handing over to idle");
            let state = state.with_processor(ActionProcessor::Idle);
            ActionProcessor::Idle.handle(p.interactor, state, event)
        }
        other => base::handle(p, state, other),
    }
}
