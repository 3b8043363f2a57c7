//! Application layer for GWEN.
//!
//! The three session components live here. Each receives the shared
//! `SessionState`, the backend and the event bus at construction, so tests can
//! wire an independent session against in-memory collaborators.

pub mod bootstrap;
pub mod chat;
pub mod file_tabs;

pub use bootstrap::{BootstrapOutcome, HealthOutcome, ModelLoadOutcome, ResilientBootstrapper};
pub use chat::{ChatPhase, SendOutcome, StreamingChatClient};
pub use file_tabs::FileTabManager;
