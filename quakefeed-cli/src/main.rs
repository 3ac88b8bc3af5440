//! quakefeed: terminal monitor for the realtime earthquake feed.
//!
//! Feed output goes to stdout; diagnostics go to stderr through `tracing`.
//! Type `help` for commands, Ctrl-C to quit.

mod app;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use app::{App, Input, help_lines, mask_token, summary_lines};
use config::{Config, Resolved};

#[derive(Parser, Debug)]
#[command(name = "quakefeed", version, about = "Realtime earthquake feed monitor")]
pub struct Cli {
    /// Access token for the feed. Never written to disk.
    #[arg(long, env = "QUAKEFEED_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Server-list endpoint.
    #[arg(long)]
    pub discovery_url: Option<String>,

    /// Socket URL used when the server list is unavailable.
    #[arg(long)]
    pub fallback_url: Option<String>,

    /// Config file (default: ~/.config/quakefeed/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wait for `toggle` instead of connecting on start.
    #[arg(long)]
    pub no_autoconnect: bool,
}

fn init_tracing() -> Result<()> {
    // JSON logs with QUAKEFEED_LOG_JSON=1, human-readable otherwise
    let json_logs = std::env::var("QUAKEFEED_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env()
        .add_directive("quakefeed=info".parse()?)
        .add_directive("quakefeed_sdk=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn print_lines(lines: impl IntoIterator<Item = String>) {
    for line in lines {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let file_config = Config::load(cli.config.as_deref());
    let resolved = Resolved::merge(&cli, &file_config);
    tracing::debug!(
        discovery = %resolved.client.discovery_url,
        fallback = %resolved.client.fallback_url,
        "Starting quakefeed"
    );

    let (handle, mut notes) = quakefeed_sdk::client::start(resolved.client.clone());
    let mut app = App::new();
    let mut token = resolved.token.clone();

    println!("🚀 quakefeed earthquake monitor");
    match &token {
        Some(t) => println!("🔑 token: {}", mask_token(t)),
        None => println!("🔑 no token set; use `toggle <token>` or QUAKEFEED_TOKEN"),
    }
    println!("type `help` for commands");

    if let Some(t) = token.as_deref().filter(|_| resolved.autoconnect) {
        handle.toggle(t).await?;
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            note = notes.recv() => match note {
                Some(note) => print_lines(app.render(&note)),
                None => break,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Input::parse(&line) {
                    Input::Toggle(new_token) => {
                        if new_token.is_some() {
                            token = new_token;
                        }
                        handle.toggle(token.as_deref().unwrap_or_default()).await?;
                    }
                    Input::Stats => println!("{}", app.status_line()),
                    Input::Summary => print_lines(summary_lines(&handle.summary().await?)),
                    Input::Help => print_lines(help_lines()),
                    Input::Quit => break,
                    Input::Empty => {}
                    Input::Unknown(cmd) => println!("unknown command: {cmd} (try `help`)"),
                },
                Ok(None) => {
                    // stdin closed; keep streaming until Ctrl-C
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("⚠️ interrupt received");
                break;
            }
        }
    }

    println!("🛑 stopping monitor...");
    let summary = handle.summary().await?;
    handle.shutdown().await?;
    while let Ok(note) = notes.try_recv() {
        print_lines(app.render(&note));
    }
    print_lines(summary_lines(&summary));
    Ok(())
}
