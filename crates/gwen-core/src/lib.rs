//! Domain layer of the GWEN workspace client.
//!
//! Holds the session record and the types shared by every component: file
//! buffers, transcript entries, stream frames, retry plans, configuration,
//! events, and the contracts of the external collaborators (backend API and
//! editor widget).

pub mod backend;
pub mod config;
pub mod editor;
pub mod error;
pub mod event;
pub mod language;
pub mod perf;
pub mod retry;
pub mod session;
pub mod stream;

// Re-export common types
pub use config::ClientConfig;
pub use error::{GwenError, Result};
pub use event::{EventBus, SessionEvent};
pub use retry::RetryPlan;
pub use session::SessionState;
pub use stream::{FrameDecoder, StreamFrame};
