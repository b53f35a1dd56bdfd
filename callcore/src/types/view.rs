//! Call state as seen by the render layer.

use serde::Serialize;

/// Overall state of the call, consumed by whatever renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewState {
    #[default]
    Idle,
    CallPreJoin,
    CallIncoming,
    CallOutgoing,
    CallConnected,
    CallRinging,
    CallBusy,
    CallDisconnected,
    CallNeedsPermission,
    NetworkFailure,
    RecipientUnavailable,
    NoSuchUser,
    UntrustedIdentity,
    CallAcceptedElsewhere,
    CallDeclinedElsewhere,
    CallOngoingElsewhere,
}

impl ViewState {
    pub fn is_error_state(self) -> bool {
        matches!(
            self,
            Self::NetworkFailure
                | Self::RecipientUnavailable
                | Self::NoSuchUser
                | Self::UntrustedIdentity
        )
    }

    /// States after which the call will not come back without a new call.
    pub fn is_terminal(self) -> bool {
        self.is_error_state()
            || matches!(
                self,
                Self::CallBusy
                    | Self::CallDisconnected
                    | Self::CallNeedsPermission
                    | Self::CallAcceptedElsewhere
                    | Self::CallDeclinedElsewhere
                    | Self::CallOngoingElsewhere
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GroupCallState {
    #[default]
    Idle,
    Disconnected,
    Connecting,
    Reconnecting,
    Connected,
    ConnectedAndJoining,
    ConnectedAndJoined,
}

impl GroupCallState {
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::ConnectedAndJoining | Self::ConnectedAndJoined
        )
    }

    pub fn is_not_idle_or_connected(self) -> bool {
        matches!(self, Self::Disconnected | Self::Connecting | Self::Reconnecting)
    }
}
