//! Console Bot
//!
//! A Courier bot whose gateway is the terminal: every line typed on stdin
//! becomes an interaction, and every response is printed. Commands are
//! still registered with the platform API, so real credentials make the
//! slash commands show up in the configured guild.
//!
//! # Usage
//!
//! ```bash
//! TOKEN=... CLIENT_ID=... GUILD_ID=... cargo run --package console-bot
//! ```

mod actions;
mod console;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use courier::core::CurrentUser;
use courier::runtime::config::ConfigLoader;
use courier::runtime::logging::{self, LoggingBuilder};
use courier::runtime::{ChannelGateway, CourierRuntime, SyncOutcome, validate_config};
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(version, about = "Drive a Courier bot from the terminal")]
struct Cli {
    /// Configuration file (defaults to courier.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-d debug, -dd trace)
    #[arg(short, action = clap::ArgAction::Count)]
    debug: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let config = match loader.load().and_then(|config| {
        validate_config(&config)?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match cli.debug {
        0 => logging::init_from_config(&config.logging),
        1 => LoggingBuilder::from_config(&config.logging)
            .with_level(Level::DEBUG)
            .init(),
        _ => LoggingBuilder::from_config(&config.logging)
            .with_level(Level::TRACE)
            .init(),
    }

    let user = CurrentUser {
        id: config.bot.application_id.clone().unwrap_or_default(),
        name: "console-bot".to_string(),
        discriminator: None,
    };
    let (gateway, events) = ChannelGateway::new(user, 32);

    let runtime = CourierRuntime::new(config)
        .actions(actions::table())
        .gateway(Arc::new(gateway));

    println!("{}", console::USAGE);
    tokio::spawn(console::read_stdin(events));

    let report = runtime.run().await?;
    match report.sync {
        Some(SyncOutcome::Registered { count, scope }) => {
            info!(count, %scope, "Commands were registered this run");
        }
        Some(SyncOutcome::Failed { error, .. }) => {
            info!(error = %error, "Commands were not registered this run");
        }
        _ => {}
    }
    info!(
        dispatched = report.dispatched,
        failed = report.failed,
        "Bye"
    );

    Ok(())
}
