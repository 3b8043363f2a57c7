//! Session domain module.
//!
//! # Module Structure
//!
//! - `state`: the shared session record (`SessionState`)
//! - `buffer`: open-file buffers and tab handles (`FileBuffer`, `TabHandle`)
//! - `catalog`: the selectable model list (`ModelCatalog`)
//! - `transcript`: chat transcript entries (`ChatTranscriptEntry`, `Transcript`)

mod buffer;
mod catalog;
mod state;
mod transcript;

pub use buffer::{BufferSnapshot, FileBuffer, TabHandle};
pub use catalog::{ModelCatalog, PREFERRED_MODEL};
pub use state::SessionState;
pub use transcript::{ChatRole, ChatTranscriptEntry, RenderState, Transcript};
