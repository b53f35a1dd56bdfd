//! The immutable snapshot every event is applied to.
//!
//! A handler receives a [`ServiceState`] by value and returns the next one.
//! The `with_*` helpers produce a modified copy; nothing outside the handler
//! can observe a half-applied change.

mod call_info;
mod device;

pub use call_info::CallInfoState;
pub use device::{CallSetupState, LocalDeviceState, VideoState};

use crate::processor::ActionProcessor;
use crate::types::{BroadcastVideoSink, CameraState};

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState {
    pub action_processor: ActionProcessor,
    pub call_info: CallInfoState,
    pub call_setup: CallSetupState,
    pub local_device: LocalDeviceState,
    pub video: VideoState,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new(ActionProcessor::Idle)
    }
}

impl ServiceState {
    pub fn new(action_processor: ActionProcessor) -> Self {
        Self {
            action_processor,
            call_info: CallInfoState::default(),
            call_setup: CallSetupState::default(),
            local_device: LocalDeviceState::default(),
            video: VideoState::default(),
        }
    }

    pub fn with_processor(mut self, action_processor: ActionProcessor) -> Self {
        self.action_processor = action_processor;
        self
    }

    pub fn with_call_info(mut self, change: impl FnOnce(&mut CallInfoState)) -> Self {
        change(&mut self.call_info);
        self
    }

    pub fn with_call_setup(mut self, change: impl FnOnce(&mut CallSetupState)) -> Self {
        change(&mut self.call_setup);
        self
    }

    pub fn with_local_device(mut self, change: impl FnOnce(&mut LocalDeviceState)) -> Self {
        change(&mut self.local_device);
        self
    }

    /// Allocates the local sink and camera if the call does not hold them yet.
    pub fn with_video_initialized(mut self) -> Self {
        if !self.video.is_initialized() {
            self.video = VideoState {
                camera: Some(CameraState::UNKNOWN),
                local_sink: Some(BroadcastVideoSink::new()),
            };
        }
        self
    }

    /// Tears the call down to `action_processor`, keeping only the peer map.
    pub fn terminated(self, action_processor: ActionProcessor) -> Self {
        Self {
            action_processor,
            call_info: CallInfoState {
                peer_map: self.call_info.peer_map,
                ..CallInfoState::default()
            },
            call_setup: CallSetupState::default(),
            local_device: LocalDeviceState::default(),
            video: VideoState::default(),
        }
    }
}
