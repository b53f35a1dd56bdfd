use crate::state::ServiceState;
use crate::types::{CallParticipant, GroupCallState, Recipient, ViewState};

/// What the render layer sees of a [`ServiceState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebRtcViewModel {
    pub state: ViewState,
    pub group_state: GroupCallState,
    pub recipient: Option<Recipient>,
    pub local_participant: CallParticipant,
    pub remote_participants: Vec<CallParticipant>,
    pub is_remote_video_offer: bool,
    pub call_connected_time: Option<i64>,
}

impl From<&ServiceState> for WebRtcViewModel {
    fn from(state: &ServiceState) -> Self {
        let local_participant = CallParticipant::create_local(
            state.local_device.camera_state,
            state.video.local_sink.clone().unwrap_or_default(),
            state.local_device.microphone_enabled,
        );

        Self {
            state: state.call_info.call_state,
            group_state: state.call_info.group_call_state,
            recipient: state.call_info.call_recipient.clone(),
            local_participant,
            remote_participants: state.call_info.remote_participants.clone(),
            is_remote_video_offer: state.call_setup.is_remote_video_offer,
            call_connected_time: state.call_info.call_connected_time,
        }
    }
}
