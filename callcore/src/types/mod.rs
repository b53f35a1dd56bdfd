pub mod call;
pub mod device;
pub mod group;
pub mod metadata;
pub mod participant;
pub mod view;

pub use call::{
    CallId, GroupId, GroupRingRecord, HangupType, OfferType, PeerCallState, Recipient,
    RecipientId, RemotePeer, RingCancelReason, RingUpdate,
};
pub use device::{
    AudioDevice, BandwidthMode, CallInProgressKind, CameraDirection, CameraState, Orientation,
    PhoneState,
};
pub use group::{
    GroupCallEndReason, GroupCallHandle, GroupConnectionState, GroupJoinState, GroupRemoteDevice,
};
pub use metadata::{
    AnswerMetadata, CallMetadata, HangupMetadata, OfferMetadata, OpaqueMessageMetadata,
    ReceivedAnswerMetadata, ReceivedOfferMetadata,
};
pub use participant::{BroadcastVideoSink, CallParticipant, CallParticipantId};
pub use view::{GroupCallState, ViewState};
