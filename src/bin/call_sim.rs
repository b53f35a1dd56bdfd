use async_trait::async_trait;
use callcore::engine::{CallEngine, EngineResult, IncomingOffer};
use callcore::event::{CallEvent, EndedRemoteEvent};
use callcore::identity::DJB_TYPE;
use callcore::messages::CallMessage;
use callcore::types::{
    AudioDevice, BandwidthMode, CallId, CallInProgressKind, CallMetadata, GroupCallHandle,
    GroupConnectionState, GroupId, GroupJoinState, GroupRemoteDevice, HangupType, OfferMetadata,
    OfferType, PhoneState, ReceivedOfferMetadata, Recipient, RecipientId, RemotePeer,
    RingCancelReason,
};
use calling_rust::calls::{
    CallPlatform, CallService, CallServiceHandle, FileRingStore, MemoryRingStore, RingStore,
    SendError, SignalingTransport,
};
use calling_rust::config::CallServiceConfig;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

const TAG: &str = "call_sim";

#[derive(Parser)]
#[command(name = "call_sim")]
#[command(about = "Runs a scripted call through the call service")]
struct Cli {
    /// JSON file with a `CallServiceConfig`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "alice")]
    peer: String,

    #[arg(long)]
    video: bool,

    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand)]
enum Scenario {
    /// Call the peer, connect, hang up.
    Outgoing,
    /// Receive an offer from the peer, answer, let the peer hang up.
    Incoming,
    /// Receive an offer from a peer we never accepted a request from.
    Untrusted,
    /// Join a group call and leave it.
    Group {
        #[arg(short, long, default_value = "friends")]
        group: String,
    },
}

/// Engine that accepts every operation and logs it.
struct SimEngine;

impl SimEngine {
    fn log(&self, operation: &str) -> EngineResult {
        info!(target: "call_sim::engine", "{operation}");
        Ok(())
    }
}

impl CallEngine for SimEngine {
    fn call(&self, remote_peer: &RecipientId, media_type: OfferType, _: u32) -> EngineResult<CallId> {
        self.log(&format!("call({remote_peer}, {media_type:?})"))?;
        Ok(CallId::new(rand::random_range(1..u64::from(u32::MAX))))
    }

    fn proceed(&self, call_id: CallId, bandwidth_mode: BandwidthMode) -> EngineResult {
        self.log(&format!("proceed({call_id}, {bandwidth_mode:?})"))
    }

    fn accept_call(&self, call_id: CallId) -> EngineResult {
        self.log(&format!("accept_call({call_id})"))
    }

    fn hangup(&self) -> EngineResult {
        self.log("hangup()")
    }

    fn received_offer(&self, offer: &IncomingOffer) -> EngineResult {
        self.log(&format!(
            "received_offer({}, age: {}s)",
            offer.call_id, offer.message_age_secs
        ))
    }

    fn received_answer(&self, call_id: CallId, _: u32, _: &[u8], _: bool, _: &[u8], _: &[u8]) -> EngineResult {
        self.log(&format!("received_answer({call_id})"))
    }

    fn received_busy(&self, call_id: CallId, _: u32) -> EngineResult {
        self.log(&format!("received_busy({call_id})"))
    }

    fn received_hangup(&self, call_id: CallId, _: u32, hangup_type: HangupType, _: u32) -> EngineResult {
        self.log(&format!("received_hangup({call_id}, {hangup_type:?})"))
    }

    fn received_ice_candidates(&self, call_id: CallId, _: u32, candidates: &[Vec<u8>]) -> EngineResult {
        self.log(&format!("received_ice_candidates({call_id}, {})", candidates.len()))
    }

    fn received_call_message(&self, sender: &RecipientId, _: u32, _: u32, _: &[u8], _: u64) -> EngineResult {
        self.log(&format!("received_call_message({sender})"))
    }

    fn message_sent(&self, call_id: CallId) -> EngineResult {
        self.log(&format!("message_sent({call_id})"))
    }

    fn message_send_failure(&self, call_id: CallId) -> EngineResult {
        self.log(&format!("message_send_failure({call_id})"))
    }

    fn reset(&self) -> EngineResult {
        self.log("reset()")
    }

    fn cancel_group_ring(&self, group_id: &GroupId, ring_id: i64, reason: RingCancelReason) -> EngineResult {
        self.log(&format!("cancel_group_ring({group_id}, {ring_id}, {reason:?})"))
    }

    fn update_bandwidth_mode(&self, mode: BandwidthMode) -> EngineResult {
        self.log(&format!("update_bandwidth_mode({mode:?})"))
    }

    fn set_audio_enabled(&self, enabled: bool) -> EngineResult {
        self.log(&format!("set_audio_enabled({enabled})"))
    }

    fn set_video_enabled(&self, enabled: bool) -> EngineResult {
        self.log(&format!("set_video_enabled({enabled})"))
    }

    fn create_group_call(&self, group_id: &GroupId) -> EngineResult<GroupCallHandle> {
        self.log(&format!("create_group_call({group_id})"))?;
        Ok(GroupCallHandle {
            client_id: rand::random_range(1..1000),
        })
    }

    fn connect_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.log(&format!("connect_group_call({})", group_call.client_id))
    }

    fn join_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.log(&format!("join_group_call({})", group_call.client_id))
    }

    fn disconnect_group_call(&self, group_call: GroupCallHandle) -> EngineResult {
        self.log(&format!("disconnect_group_call({})", group_call.client_id))
    }

    fn ring_group(&self, group_call: GroupCallHandle) -> EngineResult {
        self.log(&format!("ring_group({})", group_call.client_id))
    }

    fn set_group_outgoing_audio_muted(&self, _: GroupCallHandle, muted: bool) -> EngineResult {
        self.log(&format!("set_group_outgoing_audio_muted({muted})"))
    }

    fn set_group_outgoing_video_muted(&self, _: GroupCallHandle, muted: bool) -> EngineResult {
        self.log(&format!("set_group_outgoing_video_muted({muted})"))
    }
}

struct LoggingTransport;

#[async_trait]
impl SignalingTransport for LoggingTransport {
    async fn send_call_message(&self, recipient: &Recipient, message: CallMessage) -> Result<(), SendError> {
        let json = serde_json::to_string(&message).map_err(|e| SendError::Network(e.to_string()))?;
        info!(target: "call_sim::transport", "-> {}: {json}", recipient.id);
        Ok(())
    }

    async fn send_group_call_update(&self, group: &Recipient) -> Result<(), SendError> {
        info!(target: "call_sim::transport", "-> {}: group call update", group.id);
        Ok(())
    }
}

struct ConsolePlatform {
    accept_calls: bool,
    identity_key: Vec<u8>,
}

impl ConsolePlatform {
    fn new(accept_calls: bool) -> Self {
        let mut identity_key = vec![DJB_TYPE];
        identity_key.extend_from_slice(&rand::random::<[u8; 32]>());
        Self {
            accept_calls,
            identity_key,
        }
    }
}

impl CallPlatform for ConsolePlatform {
    fn insert_missed_call(&self, remote_peer: &RemotePeer, timestamp: i64, is_video_offer: bool) {
        info!(
            target: "call_sim::platform",
            "missed {} call from {} at {timestamp}",
            if is_video_offer { "video" } else { "audio" },
            remote_peer.recipient.id
        );
    }

    fn update_phone_state(&self, phone_state: PhoneState) {
        info!(target: "call_sim::platform", "phone state: {phone_state:?}");
    }

    fn stop_audio(&self, play_disconnect_sound: bool) {
        info!(target: "call_sim::platform", "stop audio (disconnect sound: {play_disconnect_sound})");
    }

    fn start_incoming_ringer(&self, recipient: &Recipient, _vibrate: bool) {
        info!(target: "call_sim::platform", "ringing for {}", recipient.id);
    }

    fn start_outgoing_ringer(&self) {
        info!(target: "call_sim::platform", "ringback tone");
    }

    fn set_user_audio_device(&self, device: AudioDevice) {
        info!(target: "call_sim::platform", "audio device: {device:?}");
    }

    fn set_call_in_progress_notification(&self, kind: CallInProgressKind, recipient: &Recipient) {
        info!(target: "call_sim::platform", "notification {kind:?} for {}", recipient.id);
    }

    fn stop_foreground_service(&self) {
        info!(target: "call_sim::platform", "foreground service stopped");
    }

    fn is_any_pstn_line_busy(&self) -> bool {
        false
    }

    fn is_call_request_accepted(&self, _recipient: &Recipient) -> bool {
        self.accept_calls
    }

    fn local_identity_key(&self) -> Vec<u8> {
        self.identity_key.clone()
    }

    fn set_camera_orientation(&self, degrees: i32) {
        info!(target: "call_sim::platform", "camera orientation: {degrees}");
    }

    fn start_group_ringing(&self, group: &Recipient, ring_id: i64, sender: &RecipientId) {
        info!(target: "call_sim::platform", "{sender} is ringing {} ({ring_id})", group.id);
    }
}

async fn step(handle: &CallServiceHandle, events: Vec<CallEvent>) -> anyhow::Result<()> {
    for event in events {
        handle.post(event)?;
    }
    handle.flush().await?;

    let view = handle.view_model();
    info!(
        target: TAG,
        "view: {:?} group: {:?} remotes: {}",
        view.state,
        view.group_state,
        view.remote_participants.len()
    );
    Ok(())
}

fn active_peer(handle: &CallServiceHandle) -> anyhow::Result<RemotePeer> {
    handle
        .current_state()
        .call_info
        .active_peer
        .ok_or_else(|| anyhow::anyhow!("no active call"))
}

fn remote_offer(peer: &RemotePeer, offer_type: OfferType) -> CallEvent {
    let now = Utc::now().timestamp_millis();
    let mut remote_identity_key = vec![DJB_TYPE];
    remote_identity_key.extend_from_slice(&rand::random::<[u8; 32]>());

    CallEvent::ReceivedOffer {
        call_metadata: CallMetadata::new(peer.clone(), 1),
        offer_metadata: OfferMetadata {
            opaque: Some(rand::random::<[u8; 16]>().to_vec()),
            sdp: None,
            offer_type,
        },
        received_offer_metadata: ReceivedOfferMetadata {
            remote_identity_key,
            server_received_timestamp: now - 1_500,
            server_delivered_timestamp: now,
            is_multi_ring: true,
        },
    }
}

async fn run_scenario(cli: &Cli, handle: &CallServiceHandle) -> anyhow::Result<()> {
    let offer_type = if cli.video {
        OfferType::Video
    } else {
        OfferType::Audio
    };
    let peer = Recipient::individual(cli.peer.clone());

    match &cli.scenario {
        Scenario::Outgoing => {
            step(
                handle,
                vec![CallEvent::OutgoingCall {
                    recipient: peer,
                    offer_type,
                }],
            )
            .await?;
            let remote_peer = active_peer(handle)?;
            step(
                handle,
                vec![
                    CallEvent::StartOutgoingCall {
                        remote_peer: remote_peer.clone(),
                    },
                    CallEvent::RemoteRinging {
                        remote_peer: remote_peer.clone(),
                    },
                    CallEvent::CallConnected {
                        remote_peer: remote_peer.clone(),
                    },
                ],
            )
            .await?;
            step(handle, vec![CallEvent::LocalHangup]).await?;
            step(
                handle,
                vec![CallEvent::CallConcluded {
                    remote_peer: Some(remote_peer),
                }],
            )
            .await?;
        }
        Scenario::Incoming | Scenario::Untrusted => {
            let remote_peer = RemotePeer::new(peer, CallId::new(rand::random_range(1..u64::from(u32::MAX))));
            step(handle, vec![remote_offer(&remote_peer, offer_type)]).await?;
            if matches!(cli.scenario, Scenario::Untrusted) {
                return Ok(());
            }
            step(
                handle,
                vec![
                    CallEvent::StartIncomingCall {
                        remote_peer: remote_peer.clone(),
                    },
                    CallEvent::LocalRinging {
                        remote_peer: remote_peer.clone(),
                    },
                ],
            )
            .await?;
            step(
                handle,
                vec![
                    CallEvent::AcceptCall {
                        answer_with_video: cli.video,
                    },
                    CallEvent::CallConnected {
                        remote_peer: remote_peer.clone(),
                    },
                ],
            )
            .await?;
            step(
                handle,
                vec![
                    CallEvent::EndedRemote {
                        event: EndedRemoteEvent::Hangup,
                        remote_peer: remote_peer.clone(),
                    },
                    CallEvent::CallConcluded {
                        remote_peer: Some(remote_peer),
                    },
                ],
            )
            .await?;
        }
        Scenario::Group { group } => {
            let group_recipient = Recipient::group(group.clone(), GroupId::new(group.as_bytes()));
            step(
                handle,
                vec![
                    CallEvent::PreJoinCall {
                        recipient: group_recipient.clone(),
                    },
                    CallEvent::GroupLocalDeviceStateChanged {
                        connection_state: GroupConnectionState::Connected,
                        join_state: GroupJoinState::NotJoined,
                    },
                ],
            )
            .await?;
            step(
                handle,
                vec![
                    CallEvent::OutgoingCall {
                        recipient: group_recipient,
                        offer_type,
                    },
                    CallEvent::GroupLocalDeviceStateChanged {
                        connection_state: GroupConnectionState::Connected,
                        join_state: GroupJoinState::Joined,
                    },
                    CallEvent::GroupRemoteDeviceStateChanged {
                        devices: vec![GroupRemoteDevice {
                            demux_id: 1,
                            recipient: peer,
                            audio_muted: Some(false),
                            video_muted: Some(!cli.video),
                            presenting: false,
                        }],
                    },
                ],
            )
            .await?;
            step(handle, vec![CallEvent::LocalHangup]).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CallServiceConfig::from_json_file(path).await?,
        None => CallServiceConfig::default(),
    };
    let ring_store: Arc<dyn RingStore> = match &config.ring_store_path {
        Some(path) => Arc::new(FileRingStore::open(path).await?),
        None => Arc::new(MemoryRingStore::new()),
    };
    let platform = ConsolePlatform::new(!matches!(cli.scenario, Scenario::Untrusted));

    let (handle, task) = CallService::start(
        config,
        Arc::new(SimEngine),
        Arc::new(LoggingTransport),
        Arc::new(platform),
        ring_store,
    )
    .await?;

    run_scenario(&cli, &handle).await?;

    handle.shutdown()?;
    task.await?;
    Ok(())
}
