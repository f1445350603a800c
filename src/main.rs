//! Chat Simulator CLI.
//!
//! This is the main binary entry point. See the `chat_simulator` library
//! for the engine itself.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chat_simulator::{
    irc::{self, ServerAddress},
    ConnectionEventHandler, GenerationController, MarkovGenerator, Settings,
};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "chat-simulator")]
#[command(version)]
#[command(about = "Posts Markov-generated messages that sound like a chat channel")]
struct Cli {
    /// Path to the settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and start simulating chat
    Start {
        /// Log every observed chat message
        #[arg(long)]
        debug: bool,
        /// Bot account username
        #[arg(long)]
        username: Option<String>,
        /// Channel whose chat is simulated
        #[arg(long)]
        channel: Option<String>,
        /// Number of chat messages used per generated message
        #[arg(long)]
        messages_per_generation: Option<usize>,
    },
    /// Print the resolved settings (token omitted)
    Config {
        /// Write the resolved settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stdout)
        .format_timestamp_secs()
        .init();
}

async fn start(mut settings: Settings) -> Result<()> {
    // Validation failures are fatal before anything connects.
    let (identity, engine) = settings.validate().context("Invalid settings")?;

    let address = ServerAddress {
        host: std::mem::take(&mut settings.server_host),
        port: settings.server_port,
    };
    let generator = MarkovGenerator::new(settings.generation_attempts);
    let controller = GenerationController::new(engine, generator);
    let mut handler = ConnectionEventHandler::new(identity, controller);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    println!("Quit Chat Simulator with CTRL-C.");
    log::info!(
        "Chat Simulator v{} simulating {} every {} messages",
        env!("CARGO_PKG_VERSION"),
        handler.identity().channel(),
        engine.trigger_threshold()
    );

    irc::run(&address, &mut handler, shutdown_rx).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {
            debug,
            username,
            channel,
            messages_per_generation,
        } => {
            if let Some(username) = username {
                settings.username = username;
            }
            if let Some(channel) = channel {
                settings.channel = channel;
            }
            if let Some(n) = messages_per_generation {
                settings.messages_per_generation = n;
            }
            settings.debug |= debug;

            init_logging(settings.debug);
            start(settings).await?;
        }
        Commands::Config { init } => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if init {
                let path = match cli.config {
                    Some(path) => path,
                    None => Settings::default_path()?,
                };
                settings.save(&path)?;
                println!("Settings written to {}", path.display());
            }
        }
    }

    Ok(())
}
