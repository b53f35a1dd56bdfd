//! The serial event loop that owns the call state.
//!
//! Every [`CallEvent`] (from the UI, the network or the engine) goes through
//! one unbounded queue and is applied to the current [`ServiceState`] one at
//! a time, so handlers never race each other.

use super::error::CallServiceError;
use super::interactor::{CallPlatform, ServiceInteractor, SignalingTransport};
use super::ring_store::{RingStore, write_rings};
use crate::config::CallServiceConfig;
use callcore::engine::CallEngine;
use callcore::event::CallEvent;
use callcore::state::ServiceState;
use callcore::view_model::WebRtcViewModel;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const TAG: &str = "calling_rust::calls::service";

pub(crate) enum ServiceCommand {
    Event(CallEvent),
    /// Answered once every command queued before it has been applied.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub struct CallService {
    state: ServiceState,
    interactor: ServiceInteractor,
    commands: mpsc::UnboundedReceiver<ServiceCommand>,
    state_tx: Arc<watch::Sender<ServiceState>>,
    ring_writer: JoinHandle<()>,
}

impl CallService {
    /// Loads ring history, prunes expired rings and spawns the event loop.
    ///
    /// The returned task finishes after [`CallServiceHandle::shutdown`] once
    /// every queued ring write has reached `ring_store`.
    pub async fn start(
        config: CallServiceConfig,
        engine: Arc<dyn CallEngine>,
        transport: Arc<dyn SignalingTransport>,
        platform: Arc<dyn CallPlatform>,
        ring_store: Arc<dyn RingStore>,
    ) -> Result<(CallServiceHandle, JoinHandle<()>), CallServiceError> {
        let cutoff = config.ring_cutoff_millis(Utc::now().timestamp_millis());
        let pruned = ring_store.remove_older_than(cutoff).await?;
        let rings = ring_store.all_rings().await?;
        info!(target: TAG, "Loaded {} group rings ({pruned} expired)", rings.len());

        let (ring_tx, ring_rx) = mpsc::unbounded_channel();
        let ring_writer = tokio::spawn(write_rings(ring_store, ring_rx));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ServiceState::default());
        let state_tx = Arc::new(state_tx);

        let interactor = ServiceInteractor::new(
            &config,
            engine,
            transport,
            platform,
            ring_tx,
            rings,
            command_tx.clone(),
            state_tx.clone(),
        );

        let service = Self {
            state: ServiceState::default(),
            interactor,
            commands: command_rx,
            state_tx: state_tx.clone(),
            ring_writer,
        };
        let task = tokio::spawn(service.run());

        let handle = CallServiceHandle {
            commands: command_tx,
            state: state_tx,
        };
        Ok((handle, task))
    }

    async fn run(mut self) {
        info!(target: TAG, "Call service started");
        while let Some(command) = self.commands.recv().await {
            match command {
                ServiceCommand::Event(event) => self.apply(event),
                ServiceCommand::Flush(done) => {
                    let _ = done.send(());
                }
                ServiceCommand::Shutdown => break,
            }
        }

        let Self {
            interactor,
            ring_writer,
            ..
        } = self;
        drop(interactor);
        if let Err(e) = ring_writer.await {
            warn!(target: TAG, "Ring writer failed: {e}");
        }
        info!(target: TAG, "Call service stopped");
    }

    fn apply(&mut self, event: CallEvent) {
        let processor = self.state.action_processor;
        debug!(target: TAG, "{} in {processor:?}", event.handler_name());

        let state = std::mem::take(&mut self.state);
        self.state = processor.handle(&self.interactor, state, event);

        if self.state.action_processor != processor {
            info!(
                target: TAG,
                "{processor:?} -> {:?}", self.state.action_processor
            );
        }
        self.state_tx.send_replace(self.state.clone());
    }
}

/// Cloneable front door of a running [`CallService`].
#[derive(Clone)]
pub struct CallServiceHandle {
    commands: mpsc::UnboundedSender<ServiceCommand>,
    state: Arc<watch::Sender<ServiceState>>,
}

impl CallServiceHandle {
    /// Queues `event`; it is applied after everything queued before it.
    pub fn post(&self, event: CallEvent) -> Result<(), CallServiceError> {
        self.commands
            .send(ServiceCommand::Event(event))
            .map_err(|_| CallServiceError::QueueClosed)
    }

    /// Waits until every event posted so far has been applied.
    pub async fn flush(&self) -> Result<(), CallServiceError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(ServiceCommand::Flush(done_tx))
            .map_err(|_| CallServiceError::QueueClosed)?;
        done_rx.await.map_err(|_| CallServiceError::QueueClosed)
    }

    /// Stops the loop once the events already queued have been applied.
    /// Await the task from [`CallService::start`] to know pending ring writes
    /// are persisted.
    pub fn shutdown(&self) -> Result<(), CallServiceError> {
        self.commands
            .send(ServiceCommand::Shutdown)
            .map_err(|_| CallServiceError::QueueClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// The most recently published state.
    pub fn current_state(&self) -> ServiceState {
        self.state.borrow().clone()
    }

    pub fn view_model(&self) -> WebRtcViewModel {
        WebRtcViewModel::from(&*self.state.borrow())
    }
}
