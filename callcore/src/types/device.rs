//! Local device facts: camera, orientation, audio routing, locks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CameraDirection {
    Front,
    Back,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CameraState {
    pub active_direction: CameraDirection,
    pub camera_count: u32,
}

impl CameraState {
    pub const UNKNOWN: CameraState = CameraState {
        active_direction: CameraDirection::None,
        camera_count: 0,
    };

    pub fn new(active_direction: CameraDirection, camera_count: u32) -> Self {
        Self {
            active_direction,
            camera_count,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.active_direction != CameraDirection::None
    }
}

/// Screen orientation, snapped to the four edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    #[default]
    Portrait,
    LandscapeLeftEdge,
    LandscapeRightEdge,
    PortraitBottomEdge,
}

impl Orientation {
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Self::LandscapeLeftEdge,
            180 => Self::PortraitBottomEdge,
            270 => Self::LandscapeRightEdge,
            _ => Self::Portrait,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Portrait => 0,
            Self::LandscapeLeftEdge => 90,
            Self::PortraitBottomEdge => 180,
            Self::LandscapeRightEdge => 270,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AudioDevice {
    Speakerphone,
    WiredHeadset,
    Earpiece,
    Bluetooth,
    #[default]
    None,
}

/// Wake/proximity lock profile requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneState {
    Idle,
    Processing,
    Interactive,
    InCall,
    InVideo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthMode {
    VeryLow,
    Low,
    #[default]
    Normal,
}

/// Flavour of the ongoing-call notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallInProgressKind {
    OutgoingRinging,
    IncomingConnecting,
    IncomingRinging,
    Established,
}
