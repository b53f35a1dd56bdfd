use crate::error::CallError;
use crate::types::{
    CallId, CallParticipant, GroupCallHandle, GroupCallState, Recipient, RecipientId, RemotePeer,
    ViewState,
};
use std::collections::HashMap;

/// Who the call is with and where it stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallInfoState {
    pub call_state: ViewState,
    pub call_recipient: Option<Recipient>,
    /// Millisecond timestamp of the moment media connected.
    pub call_connected_time: Option<i64>,
    pub peer_map: HashMap<CallId, RemotePeer>,
    pub active_peer: Option<RemotePeer>,
    /// Remote participants in display order; the first one is the most prominent.
    pub remote_participants: Vec<CallParticipant>,
    pub group_call: Option<GroupCallHandle>,
    pub group_call_state: GroupCallState,
}

impl CallInfoState {
    pub fn require_active_peer(&self) -> Result<&RemotePeer, CallError> {
        self.active_peer.as_ref().ok_or(CallError::NoActivePeer)
    }

    pub fn peer(&self, call_id: CallId) -> Option<&RemotePeer> {
        self.peer_map.get(&call_id)
    }

    /// Stores the peer; refreshes the active peer when it is the same call.
    pub fn put_remote_peer(&mut self, remote_peer: RemotePeer) {
        if let Some(active) = &self.active_peer
            && active.call_id_equals(Some(&remote_peer))
        {
            self.active_peer = Some(remote_peer.clone());
        }
        self.peer_map.insert(remote_peer.call_id, remote_peer);
    }

    pub fn remove_remote_peer(&mut self, remote_peer: &RemotePeer) {
        self.peer_map.remove(&remote_peer.call_id);
    }

    pub fn clear_peer_map(&mut self) {
        self.peer_map.clear();
    }

    /// Makes `remote_peer` the active peer and records it in the peer map.
    pub fn set_active_peer(&mut self, remote_peer: RemotePeer) {
        self.peer_map
            .insert(remote_peer.call_id, remote_peer.clone());
        self.active_peer = Some(remote_peer);
    }

    pub fn remote_participant(&self, recipient: &RecipientId) -> Option<&CallParticipant> {
        self.remote_participants
            .iter()
            .find(|p| &p.recipient.id == recipient)
    }

    /// Replaces the participant with the same id, or appends it.
    pub fn put_participant(&mut self, participant: CallParticipant) {
        match self
            .remote_participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => *existing = participant,
            None => self.remote_participants.push(participant),
        }
    }

    pub fn clear_participants(&mut self) {
        self.remote_participants.clear();
    }
}
