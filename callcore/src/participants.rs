//! Render layout derived from the call state.
//!
//! [`CallParticipantsState`] is rebuilt from scratch on every update; none of
//! the `update_*` functions mutate the previous value.

use crate::types::{BroadcastVideoSink, CallParticipant, CameraState, ViewState};
use crate::view_model::WebRtcViewModel;

/// Number of remote participants shown in the grid before the rest spill into the list.
pub const MAX_GRID_PARTICIPANTS: usize = 6;

/// Above this many remote participants the local self-view shrinks to a square.
const SMALL_SQUARE_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalRenderState {
    #[default]
    Gone,
    SmallSquare,
    SmallRectangle,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectedPage {
    #[default]
    Grid,
    Focused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParticipantsState {
    pub call_state: ViewState,
    pub remote_participants: Vec<CallParticipant>,
    pub local_participant: CallParticipant,
    pub focused_participant: Option<CallParticipant>,
    pub local_render_state: LocalRenderState,
    pub is_in_pip: bool,
    pub show_video_for_outgoing: bool,
    pub is_viewing_focused_participant: bool,
}

impl Default for CallParticipantsState {
    fn default() -> Self {
        Self::starting_state()
    }
}

impl CallParticipantsState {
    /// State before the first view model arrives.
    pub fn starting_state() -> Self {
        Self {
            call_state: ViewState::CallDisconnected,
            remote_participants: Vec::new(),
            local_participant: CallParticipant::create_local(
                CameraState::UNKNOWN,
                BroadcastVideoSink::new(),
                false,
            ),
            focused_participant: None,
            local_render_state: LocalRenderState::Gone,
            is_in_pip: false,
            show_video_for_outgoing: false,
            is_viewing_focused_participant: false,
        }
    }

    pub fn grid_participants(&self) -> &[CallParticipant] {
        let len = self.remote_participants.len().min(MAX_GRID_PARTICIPANTS);
        &self.remote_participants[..len]
    }

    pub fn list_participants(&self) -> &[CallParticipant] {
        let remotes = &self.remote_participants;
        if self.is_viewing_focused_participant && remotes.len() > 1 {
            &remotes[1..]
        } else if remotes.len() > MAX_GRID_PARTICIPANTS {
            &remotes[MAX_GRID_PARTICIPANTS..]
        } else {
            &[]
        }
    }

    /// Applies a new view model. `enable_video` is set when the user just turned their camera on.
    pub fn update_view_model(&self, view_model: &WebRtcViewModel, enable_video: bool) -> Self {
        let show_video_for_outgoing = if enable_video {
            view_model.state == ViewState::CallOutgoing
        } else {
            self.show_video_for_outgoing && view_model.state == ViewState::CallOutgoing
        };

        let remote_participants = view_model.remote_participants.clone();
        let local_render_state = determine_local_render_state(
            &view_model.local_participant,
            self.is_in_pip,
            show_video_for_outgoing,
            view_model.state,
            remote_participants.len(),
            self.is_viewing_focused_participant,
        );

        Self {
            call_state: view_model.state,
            focused_participant: remote_participants.first().cloned(),
            remote_participants,
            local_participant: view_model.local_participant.clone(),
            local_render_state,
            is_in_pip: self.is_in_pip,
            show_video_for_outgoing,
            is_viewing_focused_participant: self.is_viewing_focused_participant,
        }
    }

    pub fn update_pip(&self, is_in_pip: bool) -> Self {
        Self {
            is_in_pip,
            ..self.relayout(is_in_pip, self.is_viewing_focused_participant)
        }
    }

    pub fn update_selected_page(&self, selected_page: SelectedPage) -> Self {
        let is_viewing_focused_participant = selected_page == SelectedPage::Focused;
        Self {
            is_viewing_focused_participant,
            ..self.relayout(self.is_in_pip, is_viewing_focused_participant)
        }
    }

    fn relayout(&self, is_in_pip: bool, is_viewing_focused_participant: bool) -> Self {
        Self {
            focused_participant: self.remote_participants.first().cloned(),
            local_render_state: determine_local_render_state(
                &self.local_participant,
                is_in_pip,
                self.show_video_for_outgoing,
                self.call_state,
                self.remote_participants.len(),
                is_viewing_focused_participant,
            ),
            ..self.clone()
        }
    }
}

fn determine_local_render_state(
    local_participant: &CallParticipant,
    is_in_pip: bool,
    show_video_for_outgoing: bool,
    call_state: ViewState,
    remote_count: usize,
    is_viewing_focused_participant: bool,
) -> LocalRenderState {
    let display_local = !is_in_pip && local_participant.video_enabled;

    if !display_local && !show_video_for_outgoing {
        return LocalRenderState::Gone;
    }

    if call_state != ViewState::CallConnected {
        LocalRenderState::Large
    } else if is_viewing_focused_participant || remote_count > SMALL_SQUARE_THRESHOLD {
        LocalRenderState::SmallSquare
    } else {
        LocalRenderState::SmallRectangle
    }
}
