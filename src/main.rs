use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use twai::{BotConfig, Commands, Container, ContainerConfig, Router};

#[derive(Parser)]
#[command(name = "twai")]
#[command(author, version, about = "Telegram bot for Gemini chat and Stability image generation", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Use offline text and image providers instead of Gemini and Stability
    #[arg(long, global = true)]
    mock_providers: bool,

    /// Read configuration from this file instead of `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_file.as_deref())?;

    let bot = load_config(cli.env_file.as_deref())?;
    let container = Container::new(ContainerConfig {
        bot,
        mock_providers: cli.mock_providers,
    })?;

    match cli.command.unwrap_or_default() {
        Commands::CheckConfig => {
            info!("Configuration: {:?}", container.config().bot);
            let username = container.verify().await?;
            println!("Configuration OK, bot @{}", username);
        }
        Commands::Run => {
            container.verify().await?;
            if cli.mock_providers {
                info!("Running with mock providers");
            }

            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Ctrl-C received, stopping");
                        trigger.cancel();
                    }
                    Err(e) => error!("Cannot listen for Ctrl-C: {}", e),
                }
            });

            Router::new(&container).run(shutdown).await?;
            info!("Bot stopped");
        }
    }

    Ok(())
}

fn load_config(env_file: Option<&Path>) -> Result<BotConfig> {
    let config = match env_file {
        Some(path) => BotConfig::from_env_file(path)?,
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    warn!("Ignoring unreadable .env file: {}", e);
                }
            }
            BotConfig::from_env()?
        }
    };
    Ok(config)
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level))
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?);

    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            BoxMakeWriter::new(std::io::stdout.and(Arc::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(log_file.is_none())
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
