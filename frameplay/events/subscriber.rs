use log::debug;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{ManagementError, PlayerEvent};
use crate::envelope::object;
use crate::player::MediaPlayer;

/// Outbound event names, as seen by the embedder after the `player:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventName {
    Ready,
    ChangeState,
    CurrentTime,
    ChangeFullscreen,
    Error,
    PlayComplete,
    VolumeChange,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Ready => "ready",
            EventName::ChangeState => "changeState",
            EventName::CurrentTime => "currentTime",
            EventName::ChangeFullscreen => "changeFullscreen",
            EventName::Error => "error",
            EventName::PlayComplete => "playComplete",
            EventName::VolumeChange => "volumeChange",
        }
    }
}

#[derive(Serialize)]
struct ErrorData<'a> {
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Subscription table from player events to outbound messages.
#[derive(Debug, Default)]
pub struct Subscriber {
    ready_sent: bool,
}

impl Subscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages `event` produces, in emission order.
    ///
    /// State-dependent data (time, volume, fullscreen, error) is read from
    /// `player` at the moment the event is handled.
    pub fn translate<P: MediaPlayer>(
        &mut self,
        player: &P,
        event: &PlayerEvent,
    ) -> Vec<(EventName, Map<String, Value>)> {
        match event {
            PlayerEvent::Ready => {
                if self.ready_sent {
                    debug!("Ignoring repeated ready event");
                    return Vec::new();
                }
                self.ready_sent = true;
                vec![(EventName::Ready, Map::new())]
            }
            PlayerEvent::Playing => vec![change_state("playing")],
            PlayerEvent::Pause => vec![change_state("paused")],
            PlayerEvent::Ended => vec![
                change_state("stopped"),
                (EventName::PlayComplete, Map::new()),
            ],
            PlayerEvent::TimeUpdate => vec![(
                EventName::CurrentTime,
                object(json!({ "time": player.current_time() })),
            )],
            PlayerEvent::FullscreenChange => vec![(
                EventName::ChangeFullscreen,
                object(json!({ "isFullscreen": player.is_fullscreen() })),
            )],
            PlayerEvent::VolumeChange => {
                let volume = if player.muted() { 0.0 } else { player.volume() };
                vec![(EventName::VolumeChange, object(json!({ "volume": volume })))]
            }
            PlayerEvent::Error => {
                let data = player.error().map_or_else(Map::new, |error| {
                    error_data(&ErrorData {
                        reason: "playback",
                        code: Some(i64::from(error.code)),
                        text: Some(&error.message),
                    })
                });
                vec![(EventName::Error, data)]
            }
            PlayerEvent::ManagementError(ManagementError { code, text }) => vec![(
                EventName::Error,
                error_data(&ErrorData {
                    reason: "management",
                    code: *code,
                    text: text.as_deref(),
                }),
            )],
        }
    }
}

fn change_state(state: &str) -> (EventName, Map<String, Value>) {
    (EventName::ChangeState, object(json!({ "state": state })))
}

fn error_data(data: &ErrorData<'_>) -> Map<String, Value> {
    serde_json::to_value(data).map_or_else(|_| Map::new(), object)
}
