use super::App;
use anyhow::{Context, Result, bail};
use gwen_application::{HealthOutcome, ModelLoadOutcome};

pub async fn health(app: &App) -> Result<()> {
    match app
        .bootstrapper
        .check_health(app.bootstrapper.health_retry())
        .await
    {
        HealthOutcome::Healthy(report) if report.runtime_ok() => Ok(()),
        HealthOutcome::Healthy(_) => bail!("model runtime is not responding"),
        HealthOutcome::Unhealthy(_) => bail!("server is not responding"),
        HealthOutcome::Skipped => Ok(()),
    }
}

pub async fn models(app: &App) -> Result<()> {
    let outcome = app
        .bootstrapper
        .load_models(app.bootstrapper.model_retry())
        .await;
    let catalog = match outcome {
        ModelLoadOutcome::Loaded(catalog) | ModelLoadOutcome::Fallback(catalog) => catalog,
        ModelLoadOutcome::Skipped => return Ok(()),
    };

    for model in &catalog.models {
        let marker = if catalog.selected.as_deref() == Some(model.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {model}");
    }
    if !app.state.models_loaded() {
        bail!("using fallback model list");
    }
    Ok(())
}

/// Runs the startup sequence, lists the workspace and keeps the heartbeat
/// running until Ctrl-C.
pub async fn watch(app: &App) -> Result<()> {
    let (outcome, heartbeat) = app.bootstrapper.start().await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Ok(files) = app.tabs.list_files().await {
        for path in files {
            println!("{path}");
        }
    }

    let stopped = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C");
    tracing::info!("[Cli] Stopping heartbeat");
    heartbeat.abort();
    // A cancelled task is the expected result here.
    let _ = heartbeat.await;
    stopped
}
