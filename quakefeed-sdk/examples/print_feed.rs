//! Minimal feed consumer: connect, print every record, stop after N events.
//!
//! Usage:
//!   QUAKEFEED_TOKEN=... cargo run --example print_feed -- --limit 5

use anyhow::Result;
use clap::Parser;
use quakefeed_sdk::client::{self, ClientConfig};
use quakefeed_sdk::{ConnectionState, LogLevel, Notification};

#[derive(Parser)]
#[command(name = "print-feed", about = "Print earthquake feed records")]
struct Args {
    #[arg(long, env = "QUAKEFEED_TOKEN", hide_env_values = true)]
    token: String,
    /// Stop after this many data events.
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if args.token.trim().is_empty() {
        anyhow::bail!("--token must not be empty");
    }

    let (handle, mut notes) = client::start(ClientConfig::default());
    handle.toggle(&args.token).await?;

    while let Some(note) = notes.recv().await {
        match note {
            Notification::LogMessage { text, level } => {
                eprintln!("[{level}] {text}");
                // Rejected before connecting; no state change will follow.
                if level == LogLevel::Error && handle.state() == ConnectionState::Disconnected {
                    break;
                }
            }
            Notification::StatusChanged(ConnectionState::Disconnected) => break,
            Notification::StatusChanged(state) => eprintln!("status: {state}"),
            Notification::EventReceived(record) => println!("{record}"),
            Notification::StatsChanged(stats) => {
                if stats.total_count >= args.limit {
                    break;
                }
            }
        }
    }

    let summary = handle.summary().await?;
    handle.shutdown().await?;
    println!("{} message(s) received", summary.total_messages);
    Ok(())
}
