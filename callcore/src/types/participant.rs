//! Participants of a call and their render sinks.

use super::call::{Recipient, RecipientId};
use super::device::CameraState;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct SinkInner {
    id: u64,
    device_orientation_degrees: AtomicI32,
}

/// Shared handle to a video sink owned by the media engine.
///
/// Clones refer to the same sink; equality is identity.
#[derive(Debug, Clone)]
pub struct BroadcastVideoSink {
    inner: Arc<SinkInner>,
}

impl BroadcastVideoSink {
    /// Rotation value telling the sink to ignore device orientation.
    pub const DEVICE_ROTATION_IGNORE: i32 = -1;

    pub fn new() -> Self {
        Self {
            inner: Arc::new(SinkInner {
                id: NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed),
                device_orientation_degrees: AtomicI32::new(0),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn set_device_orientation_degrees(&self, degrees: i32) {
        self.inner
            .device_orientation_degrees
            .store(degrees, Ordering::Relaxed);
    }

    pub fn device_orientation_degrees(&self) -> i32 {
        self.inner.device_orientation_degrees.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastVideoSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BroadcastVideoSink {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for BroadcastVideoSink {}

/// Distinguishes multiple devices of the same user in a group call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallParticipantId {
    pub demux_id: u64,
    pub recipient: RecipientId,
}

impl CallParticipantId {
    pub const DEFAULT_DEMUX_ID: u64 = 0;

    pub fn for_recipient(recipient: RecipientId) -> Self {
        Self {
            demux_id: Self::DEFAULT_DEMUX_ID,
            recipient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParticipant {
    pub id: CallParticipantId,
    pub recipient: Recipient,
    /// Set when a send failed because this participant's identity changed.
    pub identity_key: Option<Vec<u8>>,
    pub video_sink: BroadcastVideoSink,
    pub camera_state: CameraState,
    pub video_enabled: bool,
    pub microphone_enabled: bool,
    pub screen_sharing: bool,
}

impl CallParticipant {
    pub fn create_local(
        camera_state: CameraState,
        video_sink: BroadcastVideoSink,
        microphone_enabled: bool,
    ) -> Self {
        let recipient = Recipient::local();
        Self {
            id: CallParticipantId::for_recipient(recipient.id.clone()),
            recipient,
            identity_key: None,
            video_sink,
            camera_state,
            video_enabled: camera_state.is_enabled() && camera_state.camera_count > 0,
            microphone_enabled,
            screen_sharing: false,
        }
    }

    pub fn create_remote(
        id: CallParticipantId,
        recipient: Recipient,
        video_sink: BroadcastVideoSink,
        video_enabled: bool,
        microphone_enabled: bool,
    ) -> Self {
        Self {
            id,
            recipient,
            identity_key: None,
            video_sink,
            camera_state: CameraState::UNKNOWN,
            video_enabled,
            microphone_enabled,
            screen_sharing: false,
        }
    }

    pub fn with_identity_key(mut self, identity_key: Option<Vec<u8>>) -> Self {
        self.identity_key = identity_key;
        self
    }

    pub fn with_video_enabled(mut self, video_enabled: bool) -> Self {
        self.video_enabled = video_enabled;
        self
    }

    pub fn with_screen_sharing(mut self, screen_sharing: bool) -> Self {
        self.screen_sharing = screen_sharing;
        self
    }
}
