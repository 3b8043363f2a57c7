use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "gwen")]
#[command(about = "GWEN CLI - drive a GWEN workspace backend from the terminal", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/gwen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding configuration and GWEN_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Preferred model, overriding configuration and GWEN_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe backend and model runtime health
    Health,
    /// List the models offered for chat
    Models,
    /// List workspace files
    Files,
    /// Print a workspace file
    Open { path: String },
    /// Save and execute a workspace file
    Run { path: String },
    /// Send a prompt and stream the answer
    Chat { prompt: String },
    /// Run the full startup sequence and report backend file operations
    Status,
    /// Start a session and keep the health heartbeat running until Ctrl-C
    Watch,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<gwen_core::ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => gwen_core::ClientConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .with_env_overrides(|key| std::env::var(key).ok()),
        None => gwen_core::ClientConfig::load().context("failed to load configuration")?,
    };
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.preferred_model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!("[Cli] Using backend {}", config.api_base_url);

    let app = commands::App::new(&config)?;
    let printer = console::spawn_printer(app.events.subscribe());

    let result = match cli.command {
        Commands::Health => commands::runtime::health(&app).await,
        Commands::Models => commands::runtime::models(&app).await,
        Commands::Files => commands::workspace::files(&app).await,
        Commands::Open { path } => commands::workspace::open(&app, &path).await,
        Commands::Run { path } => commands::workspace::run(&app, &path).await,
        Commands::Chat { prompt } => commands::chat::chat(&app, &prompt).await,
        Commands::Status => commands::workspace::status(&app).await,
        Commands::Watch => commands::runtime::watch(&app).await,
    };

    // Dropping the components closes the event channel and lets the printer
    // flush what is left.
    drop(app);
    printer.await.context("event printer panicked")?;
    result
}
