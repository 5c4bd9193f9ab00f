mod config_commands;
mod doctor_commands;

use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    unfurl_channels::{InboundEvent, Outbound},
    unfurl_config::UnfurlConfig,
    unfurl_dispatch::{Agent, LinkPreviewer, SeenTracker, standard_router},
};

#[derive(Parser)]
#[command(name = "unfurl", about = "unfurl — link previews and market data for chat channels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, global = true, env = "UNFURL_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one link-preview extraction and print the resulting message.
    Preview {
        /// URL to preview.
        url: String,
    },
    /// Feed one synthetic channel message through the agent, printing every
    /// outbound delivery.
    Send {
        /// Message text, commands and URLs included.
        text: String,
        /// Sender nick of the synthetic message.
        #[arg(long, default_value = "cli")]
        sender: String,
        /// Origin channel of the synthetic message.
        #[arg(long, default_value = "#cli")]
        channel: String,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Environment audit: config, browser, document tools, market data.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// The explicit `--config` path, or whatever discovery finds.
fn load_config(cli: &Cli) -> anyhow::Result<UnfurlConfig> {
    match &cli.config {
        Some(path) => unfurl_config::load_config(path),
        None => Ok(unfurl_config::discover_and_load()),
    }
}

/// Outbound seam for one-shot CLI runs: every delivery goes to stdout.
struct StdoutOutbound;

#[async_trait::async_trait]
impl Outbound for StdoutOutbound {
    async fn deliver(&self, target: &str, text: &str) -> unfurl_channels::Result<()> {
        println!("{target} <- {text}");
        Ok(())
    }
}

async fn run_preview(config: &UnfurlConfig, url: &str) -> anyhow::Result<()> {
    let previewer = LinkPreviewer::new(&config.preview)?;
    let message = previewer.preview(url, "#cli").await;
    println!("{message}");
    Ok(())
}

async fn run_send(
    config: &UnfurlConfig,
    sender: &str,
    channel: &str,
    text: &str,
) -> anyhow::Result<()> {
    let tracker = Arc::new(SeenTracker::new());
    let router = standard_router(&config.markets, tracker.clone())?;
    let links = LinkPreviewer::new(&config.preview)?;
    let agent = Agent::new(router, links, tracker, Arc::new(StdoutOutbound));

    agent
        .handle_event(InboundEvent::ChannelMessage {
            sender: sender.to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
        })
        .await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "unfurl starting");

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Preview { url } => run_preview(&config, &url).await,
        Commands::Send {
            text,
            sender,
            channel,
        } => run_send(&config, &sender, &channel, &text).await,
        Commands::Config { action } => config_commands::handle_config(action, &config),
        Commands::Doctor => doctor_commands::handle_doctor(&config),
    }
}
