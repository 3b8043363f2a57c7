//! Terminal rendering of a session.
//!
//! `ConsoleEditor` stands in for the editing widget, and the printer task
//! turns session events into stdout/stderr output.

use gwen_core::editor::{EditorInstance, EditorWidget};
use gwen_core::event::{NotificationLevel, SessionEvent};
use gwen_core::language::PLAINTEXT;
use gwen_core::session::{ChatRole, RenderState};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct EditorBuffer {
    content: String,
    language: String,
}

/// In-memory editor holding the active file's text.
#[derive(Debug, Default)]
pub struct ConsoleEditor {
    buffer: Mutex<EditorBuffer>,
}

impl ConsoleEditor {
    /// The displayed text and its language tag.
    pub fn snapshot(&self) -> (String, String) {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        (buffer.content.clone(), buffer.language.clone())
    }
}

struct ConsoleInstance {
    path: String,
}

impl EditorInstance for ConsoleInstance {
    fn dispose(&mut self) {
        tracing::trace!("[ConsoleEditor] Disposed instance for {}", self.path);
    }
}

impl EditorWidget for ConsoleEditor {
    fn set_content(&self, content: &str, language: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.content = content.to_string();
        buffer.language = language.to_string();
    }

    fn clear(&self) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.content.clear();
        buffer.language = PLAINTEXT.to_string();
    }

    fn content(&self) -> String {
        self.snapshot().0
    }

    fn create_instance(&self, path: &str) -> Box<dyn EditorInstance> {
        Box::new(ConsoleInstance {
            path: path.to_string(),
        })
    }
}

/// Renders events until every sender is gone.
pub fn spawn_printer(mut rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut printer = Printer::default();
        loop {
            match rx.recv().await {
                Ok(event) => printer.render(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Printer] Skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[derive(Default)]
struct Printer {
    /// Bytes of each assistant entry already written to stdout.
    printed: HashMap<String, usize>,
}

impl Printer {
    fn render(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TerminalReplaced { output, error } => {
                if let Some(output) = output {
                    print!("{output}");
                }
                if let Some(error) = error {
                    eprint!("{error}");
                }
            }
            SessionEvent::HealthChanged { server, runtime } => {
                eprintln!("{} / {}", server.title, runtime.title);
            }
            SessionEvent::TranscriptUpdated { entry } if entry.role == ChatRole::Assistant => {
                let printed = self.printed.entry(entry.id.clone()).or_default();
                match entry.render_state {
                    RenderState::Error => eprintln!("\n{}", entry.text),
                    _ if entry.text.len() > *printed => {
                        print!("{}", &entry.text[*printed..]);
                        *printed = entry.text.len();
                        let _ = std::io::stdout().flush();
                    }
                    _ => {}
                }
                if entry.render_state == RenderState::Complete {
                    println!();
                }
            }
            SessionEvent::Notification(notification) => match notification.level {
                NotificationLevel::Error => eprintln!("error: {}", notification.message),
                NotificationLevel::Success => eprintln!("{}", notification.message),
            },
            other => tracing::debug!("[Printer] {:?}", other),
        }
    }
}
