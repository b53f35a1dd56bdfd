use crate::types::{AudioDevice, BroadcastVideoSink, CameraState, Orientation};

/// Transient flags that only matter while a call is being set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSetupState {
    pub is_remote_video_offer: bool,
    pub accept_with_video: bool,
    pub ring_group: bool,
    pub ring_id: Option<i64>,
}

impl Default for CallSetupState {
    fn default() -> Self {
        Self {
            is_remote_video_offer: false,
            accept_with_video: false,
            ring_group: true,
            ring_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeviceState {
    pub camera_state: CameraState,
    pub microphone_enabled: bool,
    pub orientation: Orientation,
    pub landscape_enabled: bool,
    pub device_orientation: Orientation,
    pub active_audio_device: AudioDevice,
    pub available_audio_devices: Vec<AudioDevice>,
}

impl Default for LocalDeviceState {
    fn default() -> Self {
        Self {
            camera_state: CameraState::UNKNOWN,
            microphone_enabled: true,
            orientation: Orientation::Portrait,
            landscape_enabled: false,
            device_orientation: Orientation::Portrait,
            active_audio_device: AudioDevice::None,
            available_audio_devices: Vec::new(),
        }
    }
}

/// Camera and local render sink; present only while a call holds video resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoState {
    pub camera: Option<CameraState>,
    pub local_sink: Option<BroadcastVideoSink>,
}

impl VideoState {
    pub fn is_initialized(&self) -> bool {
        self.local_sink.is_some()
    }
}
