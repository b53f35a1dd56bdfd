pub mod engine;
pub mod error;
pub mod event;
pub mod identity;
pub mod interactor;
pub mod messages;
pub mod participants;
pub mod processor;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;
pub mod view_model;

pub use engine::{CallEngine, EngineResult, IncomingOffer};
pub use error::{CallError, EngineError};
pub use event::{CallEvent, EndedEvent, EndedRemoteEvent};
pub use interactor::CallInteractor;
pub use messages::CallMessage;
pub use participants::CallParticipantsState;
pub use processor::ActionProcessor;
pub use state::ServiceState;
pub use view_model::WebRtcViewModel;
