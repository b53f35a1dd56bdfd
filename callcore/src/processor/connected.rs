//! An established 1:1 call.

use super::{Processor, active, local_device};
use crate::event::CallEvent;
use crate::state::ServiceState;

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    active::handle(p, state, event, local_device::handle)
}
