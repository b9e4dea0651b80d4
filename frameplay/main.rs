use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use frameplay::bridge::Bridge;
use frameplay::config::{self, Config};
use frameplay::dbus::{self, DbusParent};
use frameplay::events;
use frameplay::player::GstPlayer;
use frameplay::App;
use log::{error, info};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tokio::task;

#[derive(Parser)]
#[command(
    name = "frameplay",
    about = "Media player host controlled by player-api-command messages.",
    version = "1.0.0"
)]
struct Cli {
    #[arg(short = 'c', long = "config", help = "Config file to load")]
    config: Option<PathBuf>,
    #[arg(short = 's', long = "source", help = "Source to load at start-up")]
    source: Option<String>,
    #[arg(long = "top-level", help = "Run without a parent; no events are posted")]
    top_level: bool,
}

#[tokio::main]
async fn main() -> Result<(), App> {
    let cli = Cli::parse();

    let config_dir = config::config_dir()?;
    let default_config = config::ensure_layout(&config_dir).await?;
    let config_path = cli.config.unwrap_or(default_config);
    let mut config = Config::load_from_file(&config_path).await?;
    if cli.source.is_some() {
        config.player.source = cli.source;
    }
    if cli.top_level {
        config.parent.name = None;
    }

    // Logger setup
    Logger::try_with_str(&config.log_level)?
        .log_to_file(FileSpec::default().directory(config_dir.join("logs")))
        .rotate(
            Criterion::Size(1_000_000),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(3),
        )
        .duplicate_to_stderr(Duplicate::None)
        .start()?;
    info!("Loaded config from {}", config_path.display());

    if config.is_embedded() {
        info!("Embedded under {:?}", config.parent.name);
    } else {
        info!("Running top-level, events stay local");
    }

    let (stop_sender, stop_receiver) = watch::channel(());
    let (command_sender, command_receiver) = mpsc::channel(16);
    let (parent, outbound) = DbusParent::new(config.parent.name.clone());
    let (events_sender, events_receiver) = events::channel();

    let player = GstPlayer::new(&config.player, events_sender.clone())?;

    let server = task::spawn({
        let bus = config.bus.clone();
        let parent_name = config.parent.name.clone();
        let stop_sender = stop_sender.clone();
        async move {
            if let Err(e) = dbus::run_dbus_server(
                &bus,
                parent_name.as_deref(),
                command_sender,
                outbound,
                stop_sender.clone(),
            )
            .await
            {
                error!("DBus server error: {}", e);
                let _ = stop_sender.send(());
            }
        }
    });

    task::spawn({
        let stop_sender = stop_sender.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted");
                let _ = stop_sender.send(());
            }
        }
    });

    let bridge = Bridge::new(player, parent, events_sender);
    let bridge = bridge.run(command_receiver, events_receiver, stop_receiver).await;
    drop(bridge);

    let _ = stop_sender.send(());
    server.await?;
    Ok(())
}
