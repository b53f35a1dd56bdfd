//! Call runtime around the `callcore` state machine.
//!
//! # Architecture
//!
//! - [`CallService`]: a tokio task that owns the call state and applies
//!   events one at a time
//! - [`CallServiceHandle`]: posts events and publishes each new state
//! - [`ServiceInteractor`]: the capabilities handlers may use, backed by a
//!   [`SignalingTransport`], a [`CallPlatform`] and a [`RingStore`]
//!
//! Network sends never block a handler. The interactor spawns the send and
//! reports the outcome as a `MessageSentSuccess` / `MessageSentError` event
//! through the same queue. Ring records take a different path: one writer task
//! drains them into the [`RingStore`] in order, and the service task waits for
//! it before finishing.

mod error;
mod interactor;
mod ring_store;
mod service;

pub use error::{CallServiceError, RingStoreError, SendError};
pub use interactor::{CallPlatform, ServiceInteractor, SignalingTransport};
pub use ring_store::{FileRingStore, MemoryRingStore, RingStore};
pub use service::{CallService, CallServiceHandle};
