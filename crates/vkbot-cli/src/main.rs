//! `vkbot` - listen to a community's long-poll event stream from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vkbot::config::Config;
use vkbot::longpoll::LongPoll;
use vkbot::{Client, client::HttpTransport};
use vkbot_types::Event;

#[derive(Parser, Debug)]
#[command(name = "vkbot", about = "VK bot long-poll client", version)]
struct Cli {
    /// Path to the YAML config file. A missing file means defaults.
    #[arg(long, short, global = true, default_value = "vkbot.yaml")]
    config: PathBuf,

    /// Community access token.
    #[arg(long, global = true, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Community id to poll.
    #[arg(long, global = true, env = "VK_GROUP_ID")]
    group_id: Option<i64>,

    /// Poll wait time in seconds, clamped to 1..=90.
    #[arg(long, global = true)]
    wait: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every event as a JSON line until interrupted.
    Listen,
    /// Acquire a long-poll server once and print the assignment.
    Server,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let config = apply_overrides(config, &cli);

    let group_id = match config.long_poll.group_id {
        Some(id) => id,
        None => bail!("no community id: pass --group-id, set VK_GROUP_ID or long_poll.group_id"),
    };

    let client = Client::from_config(&config.api, Arc::new(HttpTransport::new()))
        .context("invalid API settings")?;
    let mut long_poll =
        LongPoll::from_client(Arc::new(client), group_id).with_config(&config.long_poll);

    match cli.command {
        Command::Listen => listen(&mut long_poll).await,
        Command::Server => server(&long_poll).await,
    }
}

/// Command-line flags and environment take precedence over the file.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(token) = &cli.token {
        config.api.access_token = Some(token.clone());
    }
    if let Some(group_id) = cli.group_id {
        config.long_poll.group_id = Some(group_id);
    }
    if let Some(wait) = cli.wait {
        config.long_poll.wait_seconds = wait;
    }
    config
}

async fn listen(long_poll: &mut LongPoll) -> Result<()> {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, stopping"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
        on_signal.cancel();
    });

    let handler = |event: Event| async move {
        println!("{}", serde_json::to_string(event.as_value())?);
        anyhow::Ok(())
    };

    let summary = long_poll.listen(&handler, &cancel).await;
    info!(
        cycles = summary.cycles,
        acquisitions = summary.acquisitions,
        failures = summary.failures,
        events = summary.events_handled,
        handler_failures = summary.handler_failures,
        "Done"
    );
    Ok(())
}

async fn server(long_poll: &LongPoll) -> Result<()> {
    let server = long_poll
        .acquire()
        .await
        .context("failed to acquire long poll server")?;
    // The key is a credential and stays out of the output.
    println!("endpoint: {}", server.endpoint);
    println!("ts: {}", server.ts);
    Ok(())
}
