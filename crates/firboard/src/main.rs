//! `firboard` - CLI for the flight board service.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use firboard::cli::{Cli, Command, ConfigCommand, NormalizeCommand, ServeCommand};
use firboard::feed::{run_feed, JsonFileFeed};
use firboard::timecode::normalize_manual_entry;
use firboard::{init_logging, BoardService, Config, Direction, Reconciler, Server, SystemClock};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(serve_cmd) => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(serve(config, serve_cmd))
        }
        Command::Normalize(normalize_cmd) => {
            handle_normalize(&normalize_cmd);
            Ok(())
        }
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if cmd.inbound.is_some() {
        config.feed.inbound_path = cmd.inbound;
    }
    if cmd.outbound.is_some() {
        config.feed.outbound_path = cmd.outbound;
    }
    config.validate()?;

    let reconciler = Reconciler::new(config.board_policy(), Arc::new(SystemClock));
    let (board, service) = BoardService::spawn(
        reconciler,
        config.server.broadcast_capacity,
        config.clock_tick(),
    );

    let feeds = [
        (Direction::Inbound, config.feed.inbound_path.clone()),
        (Direction::Outbound, config.feed.outbound_path.clone()),
    ];
    for (direction, path) in feeds {
        if let Some(path) = path {
            info!(%direction, path = %path.display(), "Polling feed file");
            let source = Box::new(JsonFileFeed::new(path, direction));
            tokio::spawn(run_feed(source, board.clone(), config.poll_interval()));
        }
    }

    let server = Server::bind(config.bind_addr()?, board).await?;
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    service.abort();
    Ok(())
}

fn handle_normalize(cmd: &NormalizeCommand) {
    println!("{}", normalize_manual_entry(cmd.field.into(), &cmd.raw));
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:                 {}", config.server.bind);
                println!("  Broadcast capacity:   {}", config.server.broadcast_capacity);
                println!();
                println!("[Board]");
                println!(
                    "  Staleness (min):      {}",
                    config.board.staleness_threshold_minutes
                );
                println!(
                    "  Alignment (min):      {}",
                    config.board.alignment_tolerance_minutes
                );
                println!("  Clock tick (s):       {}", config.board.clock_tick_secs);
                println!(
                    "  Override grace (min): {}",
                    config.board.override_grace_minutes
                );
                println!();
                println!("[Feed]");
                println!("  Inbound:              {}", display_path(config.feed.inbound_path.as_ref()));
                println!("  Outbound:             {}", display_path(config.feed.outbound_path.as_ref()));
                println!("  Poll interval (ms):   {}", config.feed.poll_interval_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn display_path(path: Option<&std::path::PathBuf>) -> String {
    path.map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
}
