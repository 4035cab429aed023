//! Signalbot CLI — chat command dispatch and administrative commands.
//!
//! Commands:
//! - `signal` — issue one signal to a user and print it
//! - `grant` — subscribe a user for N days
//! - `status` — show a user's entitlement
//! - `chat` — serve `<user_id> <username> <text>` lines from stdin as chat messages

mod chat;
mod dispatch;
mod logging;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use signalbot_core::{Engine, EngineConfig, UserId};

use crate::dispatch::{render_denial, render_grant, render_signal, render_status, Dispatcher};
use crate::logging::{init_tracing, LogFormat};

#[derive(Parser)]
#[command(
    name = "signalbot",
    version,
    about = "Signalbot — randomized trading signals behind a free quota and subscriptions"
)]
struct Cli {
    /// Path to a TOML config file. Missing file means built-in defaults.
    #[arg(long, global = true, default_value = "signalbot.toml")]
    config: PathBuf,

    /// Override the user table path from the config.
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `signalbot_core=debug`. Defaults to RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue one signal to a user.
    Signal {
        /// Chat user id.
        #[arg(long, allow_negative_numbers = true)]
        user: i64,
    },
    /// Grant a subscription (administrative).
    Grant {
        /// Chat user id.
        #[arg(long, allow_negative_numbers = true)]
        user: i64,

        /// Subscription length in days. Defaults to the configured length.
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
    },
    /// Show a user's current entitlement.
    Status {
        /// Chat user id.
        #[arg(long, allow_negative_numbers = true)]
        user: i64,
    },
    /// Serve chat messages from stdin until EOF.
    Chat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref(), cli.log_format);

    let mut config = EngineConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    let engine = Engine::open(config).context("starting engine")?;

    match cli.command {
        Commands::Signal { user } => {
            match engine.request_signal(UserId(user)) {
                Ok(issued) => println!("{}", render_signal(&issued)),
                Err(denial) => println!("{}", render_denial(&denial)),
            }
            Ok(())
        }
        Commands::Grant { user, days } => {
            let grant = engine.grant_subscription(UserId(user), days)?;
            println!("{}", render_grant(&grant));
            Ok(())
        }
        Commands::Status { user } => {
            let user = UserId(user);
            match engine.status(user) {
                Some(status) => println!("{}", render_status(&status)),
                None => println!("No record for user {user}"),
            }
            Ok(())
        }
        Commands::Chat => {
            info!(admin = engine.config().admin_handle(), "serving chat on stdin");
            let dispatcher = Dispatcher::new(&engine);
            let replies = chat::run(&dispatcher, io::stdin().lock(), io::stdout().lock())?;
            info!(replies, "stdin closed, shutting down");
            Ok(())
        }
    }
}
