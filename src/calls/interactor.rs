//! The production [`CallInteractor`]: engine, signaling transport, device
//! platform and ring persistence behind one capability object.

use super::error::SendError;
use super::ring_store::RingWrite;
use super::service::ServiceCommand;
use crate::config::CallServiceConfig;
use async_trait::async_trait;
use callcore::engine::CallEngine;
use callcore::event::CallEvent;
use callcore::interactor::CallInteractor;
use callcore::messages::CallMessage;
use callcore::state::ServiceState;
use callcore::types::{
    AudioDevice, BandwidthMode, CallInProgressKind, GroupRingRecord, PhoneState, Recipient,
    RecipientId, RemotePeer, RingUpdate,
};
use dashmap::DashMap;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

const TAG: &str = "calling_rust::calls::interactor";

/// Delivers signaling to remote users.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn send_call_message(
        &self,
        recipient: &Recipient,
        message: CallMessage,
    ) -> Result<(), SendError>;

    /// Tells every group member that the set of people in the group call changed.
    async fn send_group_call_update(&self, group: &Recipient) -> Result<(), SendError>;
}

/// Device-side hooks: audio, ringers, notifications, contacts and call log.
pub trait CallPlatform: Send + Sync {
    fn insert_missed_call(&self, remote_peer: &RemotePeer, timestamp: i64, is_video_offer: bool);

    fn update_phone_state(&self, phone_state: PhoneState);

    fn stop_audio(&self, play_disconnect_sound: bool);

    fn start_incoming_ringer(&self, recipient: &Recipient, vibrate: bool);

    fn start_outgoing_ringer(&self);

    fn set_user_audio_device(&self, device: AudioDevice);

    fn set_call_in_progress_notification(&self, kind: CallInProgressKind, recipient: &Recipient);

    fn stop_foreground_service(&self);

    fn is_any_pstn_line_busy(&self) -> bool;

    fn is_call_request_accepted(&self, recipient: &Recipient) -> bool;

    fn local_identity_key(&self) -> Vec<u8>;

    fn set_camera_orientation(&self, degrees: i32);

    fn start_group_ringing(&self, group: &Recipient, ring_id: i64, sender: &RecipientId);
}

pub struct ServiceInteractor {
    config: CallServiceConfig,
    engine: Arc<dyn CallEngine>,
    transport: Arc<dyn SignalingTransport>,
    platform: Arc<dyn CallPlatform>,
    /// Ordered queue into the ring writer task; closes when this is dropped.
    ring_writes: mpsc::UnboundedSender<RingWrite>,
    rings: Arc<DashMap<i64, GroupRingRecord>>,
    commands: mpsc::UnboundedSender<ServiceCommand>,
    state_updates: Arc<watch::Sender<ServiceState>>,
}

impl ServiceInteractor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &CallServiceConfig,
        engine: Arc<dyn CallEngine>,
        transport: Arc<dyn SignalingTransport>,
        platform: Arc<dyn CallPlatform>,
        ring_writes: mpsc::UnboundedSender<RingWrite>,
        rings: Vec<GroupRingRecord>,
        commands: mpsc::UnboundedSender<ServiceCommand>,
        state_updates: Arc<watch::Sender<ServiceState>>,
    ) -> Self {
        Self {
            config: config.clone(),
            engine,
            transport,
            platform,
            ring_writes,
            rings: Arc::new(
                rings
                    .into_iter()
                    .map(|record| (record.ring_id, record))
                    .collect(),
            ),
            commands,
            state_updates,
        }
    }

    fn queue_ring_write(&self, write: RingWrite) {
        if self.ring_writes.send(write).is_err() {
            warn!(target: TAG, "Ring writer stopped, dropping {write:?}");
        }
    }

    fn post(commands: &mpsc::UnboundedSender<ServiceCommand>, event: CallEvent) {
        if commands.send(ServiceCommand::Event(event)).is_err() {
            debug!(target: TAG, "call service stopped before a send result arrived");
        }
    }
}

impl CallInteractor for ServiceInteractor {
    fn engine(&self) -> &dyn CallEngine {
        self.engine.as_ref()
    }

    fn local_device_id(&self) -> u32 {
        self.config.local_device_id
    }

    fn send_call_message(&self, recipient: &Recipient, mut message: CallMessage) {
        message.multi_ring &= self.config.multi_ring;

        let transport = self.transport.clone();
        let commands = self.commands.clone();
        let recipient = recipient.clone();

        tokio::spawn(async move {
            let kind = message.kind();
            let call_id = message.call_id();
            let result = transport.send_call_message(&recipient, message).await;

            let event = match (call_id, result) {
                (Some(call_id), Ok(())) => CallEvent::MessageSentSuccess { call_id },
                (Some(call_id), Err(e)) => {
                    warn!(target: TAG, "Failed to send {kind} for call {call_id}: {e}");
                    CallEvent::MessageSentError {
                        call_id,
                        error_call_state: e.error_call_state(),
                        identity_key: e.identity_key(),
                    }
                }
                (None, Ok(())) => return,
                (None, Err(e)) => {
                    warn!(target: TAG, "Failed to send {kind} to {}: {e}", recipient.id);
                    CallEvent::GroupMessageSentError {
                        recipients: vec![recipient.id],
                        error_call_state: e.error_call_state(),
                    }
                }
            };
            Self::post(&commands, event);
        });
    }

    fn send_group_call_message(&self, group: &Recipient) {
        let transport = self.transport.clone();
        let commands = self.commands.clone();
        let group = group.clone();

        tokio::spawn(async move {
            if let Err(e) = transport.send_group_call_update(&group).await {
                warn!(target: TAG, "Failed to send group call update to {}: {e}", group.id);
                Self::post(
                    &commands,
                    CallEvent::GroupMessageSentError {
                        recipients: vec![group.id],
                        error_call_state: e.error_call_state(),
                    },
                );
            }
        });
    }

    fn insert_missed_call(&self, remote_peer: &RemotePeer, timestamp: i64, is_video_offer: bool) {
        self.platform
            .insert_missed_call(remote_peer, timestamp, is_video_offer);
    }

    fn update_phone_state(&self, phone_state: PhoneState) {
        self.platform.update_phone_state(phone_state);
    }

    fn stop_audio(&self, play_disconnect_sound: bool) {
        self.platform.stop_audio(play_disconnect_sound);
    }

    fn start_incoming_ringer(&self, recipient: &Recipient, vibrate: bool) {
        self.platform.start_incoming_ringer(recipient, vibrate);
    }

    fn start_outgoing_ringer(&self) {
        self.platform.start_outgoing_ringer();
    }

    fn set_user_audio_device(&self, device: AudioDevice) {
        self.platform.set_user_audio_device(device);
    }

    fn set_call_in_progress_notification(&self, kind: CallInProgressKind, recipient: &Recipient) {
        self.platform
            .set_call_in_progress_notification(kind, recipient);
    }

    fn stop_foreground_service(&self) {
        self.platform.stop_foreground_service();
    }

    fn post_state_update(&self, state: &ServiceState) {
        self.state_updates.send_replace(state.clone());
    }

    fn is_any_pstn_line_busy(&self) -> bool {
        self.platform.is_any_pstn_line_busy()
    }

    fn is_call_request_accepted(&self, recipient: &Recipient) -> bool {
        self.platform.is_call_request_accepted(recipient)
    }

    fn local_identity_key(&self) -> Vec<u8> {
        self.platform.local_identity_key()
    }

    fn bandwidth_mode(&self) -> BandwidthMode {
        self.config.bandwidth_mode
    }

    fn set_camera_orientation(&self, degrees: i32) {
        self.platform.set_camera_orientation(degrees);
    }

    fn group_ring(&self, ring_id: i64) -> Option<GroupRingRecord> {
        self.rings.get(&ring_id).map(|record| *record)
    }

    fn insert_or_update_group_ring(&self, ring_id: i64, timestamp: i64, ring_update: RingUpdate) {
        let record = GroupRingRecord {
            ring_id,
            timestamp,
            ring_update,
        };

        let cutoff = self.config.ring_cutoff_millis(timestamp);
        let cached = self.rings.len();
        self.rings.retain(|_, r| r.timestamp >= cutoff);
        let expired = cached - self.rings.len();
        self.rings.insert(ring_id, record);

        if expired > 0 {
            debug!(target: TAG, "Dropped {expired} expired rings from cache");
            self.queue_ring_write(RingWrite::Prune { before: cutoff });
        }
        self.queue_ring_write(RingWrite::Upsert(record));
    }

    fn start_group_ringing(&self, group: &Recipient, ring_id: i64, sender: &RecipientId) {
        self.platform.start_group_ringing(group, ring_id, sender);
    }
}
