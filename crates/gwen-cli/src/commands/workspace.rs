use super::App;
use anyhow::Result;

pub async fn files(app: &App) -> Result<()> {
    for path in app.tabs.list_files().await? {
        println!("{path}");
    }
    Ok(())
}

pub async fn open(app: &App, path: &str) -> Result<()> {
    app.tabs.open_file(path).await?;
    let (content, language) = app.editor.snapshot();
    eprintln!("--- {path} ({language})");
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Opens `path` if needed, then saves and executes it.
pub async fn run(app: &App, path: &str) -> Result<()> {
    app.tabs.open_file(path).await?;
    let result = app.tabs.run_current().await?;
    if result.has_error() {
        anyhow::bail!("{path} exited with an error");
    }
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    let outcome = app.bootstrapper.bootstrap().await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match app.tabs.file_status().await {
        Ok(operations) => println!("{}", serde_json::to_string_pretty(&operations)?),
        Err(e) => tracing::warn!("[Cli] File status unavailable: {}", e),
    }
    Ok(())
}
