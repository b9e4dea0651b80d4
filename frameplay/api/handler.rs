use log::{error, info, warn};
use serde_json::{Map, Value};

use super::Message;
use crate::error::App;
use crate::events::{EventSender, ManagementError, PlayerEvent};
use crate::player::{parse_sources, MediaPlayer, MediaSource};

/// Names accepted by [`Command::parse`], as they appear after `player:`.
pub const COMMAND_NAMES: [&str; 10] = [
    "play",
    "pause",
    "stop",
    "setCurrentTime",
    "relativelySeek",
    "changeVideo",
    "mute",
    "unMute",
    "setVolume",
    "remove",
];

/// Management error codes.
pub const UNKNOWN_COMMAND: i64 = 1;
pub const INVALID_ARGUMENT: i64 = 2;
pub const PLAYER_FAILURE: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    /// Reload the current source, resetting playback.
    Stop,
    /// Seek to an absolute time in seconds.
    SetCurrentTime(f64),
    /// Seek by an offset in seconds, never before zero.
    RelativelySeek(f64),
    /// Replace the source; `None` leaves the player untouched.
    ChangeVideo(Option<Vec<MediaSource>>),
    Mute,
    UnMute,
    /// Set volume in 0–1; zero also mutes, anything else unmutes.
    SetVolume(f64),
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownCommand,
    InvalidArgument(String),
}

impl Rejection {
    fn code(&self) -> i64 {
        match self {
            Rejection::UnknownCommand => UNKNOWN_COMMAND,
            Rejection::InvalidArgument(_) => INVALID_ARGUMENT,
        }
    }
}

fn number(data: &Map<String, Value>, field: &str) -> Result<f64, Rejection> {
    data.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| Rejection::InvalidArgument(format!("`{field}` must be a number")))
}

impl Command {
    pub fn parse(message: &Message) -> Result<Self, Rejection> {
        let data = &message.data;
        let command = match message.type_name.as_str() {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "stop" => Command::Stop,
            "setCurrentTime" => Command::SetCurrentTime(number(data, "time")?),
            "relativelySeek" => Command::RelativelySeek(number(data, "time")?),
            "changeVideo" => {
                let source = data.get("source").unwrap_or(&Value::Null);
                let sources = parse_sources(source)
                    .map_err(|e| Rejection::InvalidArgument(e.to_string()))?;
                Command::ChangeVideo(sources)
            }
            "mute" => Command::Mute,
            "unMute" => Command::UnMute,
            "setVolume" => Command::SetVolume(number(data, "volume")?),
            "remove" => Command::Remove,
            _ => return Err(Rejection::UnknownCommand),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::SetCurrentTime(_) => "setCurrentTime",
            Command::RelativelySeek(_) => "relativelySeek",
            Command::ChangeVideo(_) => "changeVideo",
            Command::Mute => "mute",
            Command::UnMute => "unMute",
            Command::SetVolume(_) => "setVolume",
            Command::Remove => "remove",
        }
    }

    /// Runs the command against `player`.
    pub fn apply<P: MediaPlayer>(self, player: &mut P) -> Result<(), App> {
        match self {
            Command::Play => player.play(),
            Command::Pause => player.pause(),
            Command::Stop => {
                let current = player.source();
                if current.is_empty() {
                    warn!("Stop requested with no source loaded");
                    return Ok(());
                }
                player.set_source(current)
            }
            Command::SetCurrentTime(time) => player.set_current_time(time),
            Command::RelativelySeek(offset) => {
                let result_time = (player.current_time() + offset).max(0.0);
                player.set_current_time(result_time)
            }
            Command::ChangeVideo(Some(sources)) => player.set_source(sources),
            Command::ChangeVideo(None) => Ok(()),
            Command::Mute => player.set_muted(true),
            Command::UnMute => player.set_muted(false),
            Command::SetVolume(volume) => {
                player.set_volume(volume)?;
                #[allow(clippy::float_cmp)]
                let silent = volume == 0.0;
                player.set_muted(silent)
            }
            Command::Remove => player.dispose(),
        }
    }
}

/// Facade over the player: validates messages and dispatches commands.
///
/// Problems never escape as errors; they are logged and raised as
/// management error events for the embedder.
#[derive(Debug)]
pub struct Handler {
    events: EventSender,
    disposed: bool,
}

impl Handler {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn handler_exists(type_name: &str) -> bool {
        COMMAND_NAMES.contains(&type_name)
    }

    /// Handles one message. Returns true when a command ran successfully.
    pub fn facade<P: MediaPlayer>(&mut self, player: &mut P, message: &Message) -> bool {
        if self.disposed {
            warn!("Player already removed, dropping {}", message.type_name);
            return false;
        }

        let parsed = if Self::handler_exists(&message.type_name) {
            Command::parse(message)
        } else {
            Err(Rejection::UnknownCommand)
        };
        let command = match parsed {
            Ok(command) => command,
            Err(rejection) => {
                warn!("Wrong data: {:?} ({:?})", message, rejection);
                let text = serde_json::to_string(message)
                    .unwrap_or_else(|_| message.type_name.clone());
                self.error(Some(rejection.code()), format!("wrong message: {text}"));
                return false;
            }
        };

        let name = command.name();
        let removes = command == Command::Remove;
        info!("{} {:?}", name, message.data);
        match command.apply(player) {
            Ok(()) => {
                if removes {
                    self.disposed = true;
                }
                true
            }
            Err(e) => {
                error!("Failed to {}: {}", name, e);
                self.error(Some(PLAYER_FAILURE), e.to_string());
                false
            }
        }
    }

    fn error(&self, code: Option<i64>, text: String) {
        let event = PlayerEvent::ManagementError(ManagementError {
            code,
            text: Some(text),
        });
        if self.events.send(event).is_err() {
            error!("Failed to raise management error: event channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::player::mock::{Call, MockPlayer};
    use serde_json::json;

    fn message(type_name: &str, data: Value) -> Message {
        Message {
            type_name: type_name.to_string(),
            data: crate::envelope::object(data),
        }
    }

    fn handler() -> (Handler, events::EventReceiver) {
        let (tx, rx) = events::channel();
        (Handler::new(tx), rx)
    }

    #[test]
    fn every_command_name_parses() {
        for name in COMMAND_NAMES {
            let data = json!({"time": 1, "volume": 0.5, "source": "a.mp4"});
            let command = Command::parse(&message(name, data)).unwrap();
            assert_eq!(command.name(), name);
            assert!(Handler::handler_exists(name));
        }
    }

    #[test]
    fn unknown_type_fires_no_handler_and_raises_management_error() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer::default();

        for name in ["explode", "", "Play", "toString", "player:play"] {
            assert!(!handler.facade(&mut player, &message(name, json!({}))));
        }
        assert!(player.calls.is_empty());

        let Ok(PlayerEvent::ManagementError(error)) = rx.try_recv() else {
            panic!("expected a management error");
        };
        assert_eq!(error.code, Some(UNKNOWN_COMMAND));
        assert_eq!(
            error.text.as_deref(),
            Some(r#"wrong message: {"type":"explode","data":{}}"#)
        );
    }

    #[test]
    fn transport_and_mute_commands_call_the_player_once() {
        let cases = [
            ("play", Call::Play),
            ("pause", Call::Pause),
            ("mute", Call::SetMuted(true)),
            ("unMute", Call::SetMuted(false)),
            ("remove", Call::Dispose),
        ];
        for (name, expected) in cases {
            let (mut handler, _rx) = handler();
            let mut player = MockPlayer::default();
            assert!(handler.facade(&mut player, &message(name, json!({}))));
            assert_eq!(player.calls, vec![expected]);
        }
    }

    #[test]
    fn set_current_time_seeks_once_to_the_given_time() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer::default();
        handler.facade(&mut player, &message("setCurrentTime", json!({"time": 42})));
        assert_eq!(player.calls, vec![Call::SetCurrentTime(42.0)]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn relatively_seek_moves_from_current_time() {
        let (mut handler, _rx) = handler();
        let mut player = MockPlayer {
            time: 30.0,
            ..MockPlayer::default()
        };
        handler.facade(&mut player, &message("relativelySeek", json!({"time": -10})));
        handler.facade(&mut player, &message("relativelySeek", json!({"time": 2.5})));
        assert_eq!(
            player.calls,
            vec![Call::SetCurrentTime(20.0), Call::SetCurrentTime(22.5)]
        );
    }

    #[test]
    fn relatively_seek_never_goes_below_zero() {
        let (mut handler, _rx) = handler();
        let mut player = MockPlayer {
            time: 5.0,
            ..MockPlayer::default()
        };
        handler.facade(&mut player, &message("relativelySeek", json!({"time": -60})));
        assert_eq!(player.calls, vec![Call::SetCurrentTime(0.0)]);
    }

    #[test]
    fn set_volume_zero_mutes_and_nonzero_unmutes() {
        let (mut handler, _rx) = handler();
        let mut player = MockPlayer::default();

        handler.facade(&mut player, &message("setVolume", json!({"volume": 0})));
        assert!(player.muted);
        handler.facade(&mut player, &message("setVolume", json!({"volume": 0.4})));
        assert!(!player.muted);

        assert_eq!(
            player.calls,
            vec![
                Call::SetVolume(0.0),
                Call::SetMuted(true),
                Call::SetVolume(0.4),
                Call::SetMuted(false),
            ]
        );
    }

    #[test]
    fn stop_reloads_the_current_source() {
        let (mut handler, _rx) = handler();
        let source = vec![MediaSource::url("https://cdn.example/a.mp4")];
        let mut player = MockPlayer {
            sources: source.clone(),
            time: 80.0,
            ..MockPlayer::default()
        };
        assert!(handler.facade(&mut player, &message("stop", json!({}))));
        assert_eq!(player.calls, vec![Call::SetSource(source)]);
        assert!(player.time.abs() < f64::EPSILON);
    }

    #[test]
    fn stop_without_source_does_nothing() {
        let (mut handler, _rx) = handler();
        let mut player = MockPlayer::default();
        assert!(handler.facade(&mut player, &message("stop", json!({}))));
        assert!(player.calls.is_empty());
    }

    #[test]
    fn change_video_only_with_a_source() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer::default();

        for data in [
            json!({"id": "abc"}),
            json!({"source": null}),
            json!({"source": ""}),
            json!({"source": false}),
            json!({"source": 0}),
        ] {
            assert!(handler.facade(&mut player, &message("changeVideo", data)));
        }
        assert!(player.calls.is_empty());
        assert!(rx.try_recv().is_err());

        handler.facade(
            &mut player,
            &message(
                "changeVideo",
                json!({"source": {"src": "b.webm", "type": "video/webm"}}),
            ),
        );
        assert_eq!(
            player.calls,
            vec![Call::SetSource(vec![MediaSource {
                src: "b.webm".to_string(),
                mime_type: Some("video/webm".to_string()),
            }])]
        );
    }

    #[test]
    fn missing_argument_is_rejected_without_a_player_call() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer::default();
        assert!(!handler.facade(&mut player, &message("setCurrentTime", json!({}))));
        assert!(!handler.facade(&mut player, &message("setVolume", json!({"volume": "loud"}))));
        assert!(player.calls.is_empty());

        let Ok(PlayerEvent::ManagementError(error)) = rx.try_recv() else {
            panic!("expected a management error");
        };
        assert_eq!(error.code, Some(INVALID_ARGUMENT));
    }

    #[test]
    fn player_failure_is_raised_not_propagated() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer {
            fail: true,
            ..MockPlayer::default()
        };
        assert!(!handler.facade(&mut player, &message("play", json!({}))));

        let Ok(PlayerEvent::ManagementError(error)) = rx.try_recv() else {
            panic!("expected a management error");
        };
        assert_eq!(error.code, Some(PLAYER_FAILURE));
        assert_eq!(error.text.as_deref(), Some("Player error: backend refused"));
    }

    #[test]
    fn messages_after_remove_are_dropped() {
        let (mut handler, mut rx) = handler();
        let mut player = MockPlayer::default();
        assert!(handler.facade(&mut player, &message("remove", json!({}))));
        assert!(handler.is_disposed());

        assert!(!handler.facade(&mut player, &message("play", json!({}))));
        assert_eq!(player.calls, vec![Call::Dispose]);
        assert!(rx.try_recv().is_err());
    }
}
