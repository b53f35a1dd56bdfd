pub use callcore::{engine, event, messages, participants, processor, state, types, view_model};

pub mod calls;
pub mod config;

pub use calls::{CallService, CallServiceError, CallServiceHandle};
pub use config::CallServiceConfig;
