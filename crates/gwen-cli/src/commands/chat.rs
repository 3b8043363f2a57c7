use super::App;
use anyhow::{Result, bail};
use gwen_application::SendOutcome;

pub async fn chat(app: &App, prompt: &str) -> Result<()> {
    // The catalog decides which model the request names.
    app.bootstrapper
        .load_models(app.bootstrapper.model_retry())
        .await;

    match app.chat.send(prompt).await {
        SendOutcome::Completed { .. } => Ok(()),
        SendOutcome::Errored { message, .. } => bail!(message),
        SendOutcome::Ignored => bail!("prompt is empty"),
        SendOutcome::Skipped => bail!("a chat request is already in flight"),
    }
}
