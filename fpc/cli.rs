mod error;

use clap::{Parser, Subcommand};
use error::App;
use frameplay::config::{DEFAULT_BUS_NAME, DEFAULT_PARENT_NAME};
use frameplay::{Envelope, COMMAND_SCHEME};
use futures_util::stream::StreamExt;
use serde_json::{json, Value};
use tokio::process::Command;
use zbus::{proxy, Connection, ConnectionBuilder};

type StdResult<T> = std::result::Result<T, App>;

#[proxy(
    interface = "org.frameplay.Player",
    default_service = "org.frameplay.Player",
    default_path = "/org/frameplay/Player"
)]
trait FramePlayer {
    async fn test_connection(&self) -> zbus::Result<()>;
    async fn post_message(&self, message: &str) -> zbus::Result<()>;
    async fn quit(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn event(&self, payload: String) -> zbus::Result<()>;
}

#[derive(Parser)]
#[command(
    name = "fpc",
    about = "Control the frameplay player.",
    version = "1.0.0"
)]
struct Cli {
    #[arg(long = "bus", default_value = DEFAULT_BUS_NAME, help = "Bus name of the player")]
    bus: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start or resume playback")]
    Play,

    #[command(about = "Pause playback")]
    Pause,

    #[command(about = "Reload the current source from the beginning")]
    Stop,

    #[command(about = "Seek to an absolute time in seconds")]
    Seek { time: f64 },

    #[command(about = "Seek forward (or back, with a negative offset) in seconds")]
    Skip {
        #[arg(allow_negative_numbers = true)]
        offset: f64,
    },

    #[command(about = "Load a new source")]
    Load(LoadCommand),

    #[command(about = "Mute")]
    Mute,

    #[command(about = "Unmute")]
    Unmute,

    #[command(about = "Set the volume, 0 to 1; 0 also mutes")]
    Volume { level: f64 },

    #[command(about = "Remove the player and release its resources")]
    Remove,

    #[command(about = "Post a raw envelope, e.g. '{\"type\":\"player:play\"}'")]
    Raw { envelope: String },

    #[command(about = "Act as the parent and print every event the player posts")]
    Listen {
        #[arg(long = "parent", default_value = DEFAULT_PARENT_NAME, help = "Bus name to claim as parent")]
        parent: String,
    },

    #[command(about = "Shut the player host down")]
    Quit,

    #[command(about = "Start the player host")]
    Start,
}

#[derive(Parser)]
struct LoadCommand {
    #[arg(help = "URI or local path")]
    source: String,
    #[arg(short = 't', long = "type", help = "MIME type of the source")]
    mime_type: Option<String>,
}

#[tokio::main]
async fn main() -> StdResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Listen { parent } => listen(&cli.bus, &parent).await,
        command => {
            let connection = Connection::session().await?;
            let proxy = FramePlayerProxy::builder(&connection)
                .destination(cli.bus.as_str())?
                .build()
                .await?;
            handle_command(command, &proxy).await
        }
    }
}

async fn handle_command(command: Commands, proxy: &FramePlayerProxy<'_>) -> StdResult<()> {
    if let Commands::Start = command {
        return start_frameplay(proxy).await;
    }
    if !is_frameplay_running(proxy).await? {
        eprintln!("frameplay is not running");
        return Ok(());
    }
    if let Commands::Quit = command {
        proxy.quit().await?;
        println!("frameplay stopped");
        return Ok(());
    }
    let message = command_message(&command)?;
    proxy.post_message(&message).await?;
    println!("{message}");
    Ok(())
}

/// Builds the posted string for a player command.
fn command_message(command: &Commands) -> StdResult<String> {
    let (name, data) = match command {
        Commands::Play => ("play", json!({})),
        Commands::Pause => ("pause", json!({})),
        Commands::Stop => ("stop", json!({})),
        Commands::Seek { time } => ("setCurrentTime", json!({ "time": time })),
        Commands::Skip { offset } => ("relativelySeek", json!({ "time": offset })),
        Commands::Load(load) => {
            let source = match &load.mime_type {
                Some(mime_type) => json!({ "src": load.source, "type": mime_type }),
                None => json!(load.source),
            };
            ("changeVideo", json!({ "source": source }))
        }
        Commands::Mute => ("mute", json!({})),
        Commands::Unmute => ("unMute", json!({})),
        Commands::Volume { level } => {
            if !(0.0..=1.0).contains(level) {
                return Err(App::InvalidInput(format!(
                    "volume must be within 0..=1, got {level}"
                )));
            }
            ("setVolume", json!({ "volume": level }))
        }
        Commands::Remove => ("remove", json!({})),
        Commands::Raw { envelope } => {
            serde_json::from_str::<Value>(envelope)?;
            return Ok(format!("{COMMAND_SCHEME}{envelope}"));
        }
        Commands::Listen { .. } | Commands::Quit | Commands::Start => {
            return Err(App::InvalidInput("not a player command".to_string()));
        }
    };
    let envelope = Envelope::prefixed(name, frameplay::envelope::object(data));
    Ok(format!("{COMMAND_SCHEME}{}", envelope.to_json()?))
}

async fn listen(bus: &str, parent: &str) -> StdResult<()> {
    let connection = ConnectionBuilder::session()?.name(parent)?.build().await?;
    let proxy = FramePlayerProxy::builder(&connection)
        .destination(bus)?
        .build()
        .await?;
    let mut events = proxy.receive_event().await?;
    eprintln!("Listening as {parent}");
    while let Some(signal) = events.next().await {
        let args = signal.args()?;
        println!("{}", args.payload());
    }
    Ok(())
}

async fn is_frameplay_running(proxy: &FramePlayerProxy<'_>) -> StdResult<bool> {
    match proxy.test_connection().await {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

async fn start_frameplay(proxy: &FramePlayerProxy<'_>) -> StdResult<()> {
    if is_frameplay_running(proxy).await? {
        println!("frameplay is already running");
        return Ok(());
    }

    let current_exe_path = std::env::current_exe()?;
    let exe_dir = current_exe_path.parent().ok_or_else(|| {
        App::InvalidInput("Failed to get the directory of the executable".to_string())
    })?;
    let frameplay_path = exe_dir.join("frameplay");

    if !frameplay_path.exists() {
        return Err(App::InvalidInput(
            "frameplay executable not found in the same directory".to_string(),
        ));
    }

    let child = Command::new(frameplay_path).spawn().map_err(App::Io)?;
    println!("frameplay started, process ID: {:?}", child.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(command: &Commands) -> Value {
        let message = command_message(command).unwrap();
        let payload = message.strip_prefix(COMMAND_SCHEME).unwrap();
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn seek_and_skip_carry_time() {
        assert_eq!(
            decoded(&Commands::Seek { time: 42.0 }),
            json!({"type": "player:setCurrentTime", "data": {"time": 42.0}})
        );
        assert_eq!(
            decoded(&Commands::Skip { offset: -5.0 }),
            json!({"type": "player:relativelySeek", "data": {"time": -5.0}})
        );
    }

    #[test]
    fn load_uses_object_form_only_with_a_type() {
        let plain = decoded(&Commands::Load(LoadCommand {
            source: "https://cdn.example/a.mp4".to_string(),
            mime_type: None,
        }));
        assert_eq!(plain["data"]["source"], json!("https://cdn.example/a.mp4"));

        let typed = decoded(&Commands::Load(LoadCommand {
            source: "a.webm".to_string(),
            mime_type: Some("video/webm".to_string()),
        }));
        assert_eq!(
            typed["data"]["source"],
            json!({"src": "a.webm", "type": "video/webm"})
        );
    }

    #[test]
    fn volume_out_of_range_is_refused() {
        assert!(command_message(&Commands::Volume { level: 1.5 }).is_err());
        assert_eq!(
            decoded(&Commands::Volume { level: 0.0 }),
            json!({"type": "player:setVolume", "data": {"volume": 0.0}})
        );
    }

    #[test]
    fn raw_envelopes_must_be_json() {
        assert!(command_message(&Commands::Raw {
            envelope: "{oops".to_string()
        })
        .is_err());
        assert_eq!(
            command_message(&Commands::Raw {
                envelope: r#"{"type":"player:play"}"#.to_string()
            })
            .unwrap(),
            r#"player-api-command://{"type":"player:play"}"#
        );
    }

    #[test]
    fn unmute_maps_to_camel_case_command() {
        assert_eq!(decoded(&Commands::Unmute)["type"], json!("player:unMute"));
    }

    #[test]
    fn cli_parses_negative_offsets() {
        let cli = Cli::try_parse_from(["fpc", "skip", "-10"]).unwrap();
        assert!(matches!(cli.command, Commands::Skip { offset } if (offset + 10.0).abs() < f64::EPSILON));
        assert_eq!(cli.bus, DEFAULT_BUS_NAME);
    }
}
