use crate::config;
use crate::error::App;
use crate::events::{EventSender, PlayerEvent};
use crate::player::{MediaError, MediaPlayer, MediaSource};
use futures_util::stream::StreamExt;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Element, MessageView, SeekFlags, State};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{self, JoinHandle};

/// `playbin`-backed player.
///
/// Bus messages and property notifications are reported on the event sender
/// given to [`GstPlayer::new`].
#[derive(Debug)]
pub struct GstPlayer {
    playbin: Element,
    sources: Vec<MediaSource>,
    error: Arc<Mutex<Option<MediaError>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl GstPlayer {
    pub fn new(config: &config::Player, events: EventSender) -> Result<Self, App> {
        gstreamer::init().map_err(|e| App::Init(e.to_string()))?;
        let playbin = gstreamer::ElementFactory::make("playbin")
            .name("frameplay")
            .build()
            .map_err(|e| App::Element(format!("Failed to create playbin: {e}")))?;
        playbin.set_property("volume", config.volume.clamp(0.0, 1.0));
        playbin.set_property("mute", config.muted);

        let mut player = Self {
            playbin,
            sources: Vec::new(),
            error: Arc::new(Mutex::new(None)),
            tasks: Vec::new(),
        };
        player.watch_volume(&events);
        let bus_listener = player.listen_to_bus(events.clone())?;
        let ticker = player.start_time_updates(
            events.clone(),
            Duration::from_millis(config.time_update_ms),
        );
        player.tasks.extend([bus_listener, ticker]);

        if let Some(source) = &config.source {
            player.set_source(vec![MediaSource::url(source.as_str())])?;
            if config.autoplay {
                player.play()?;
            }
        }

        info!("GStreamer playbin created successfully.");
        events.send(PlayerEvent::Ready)?;
        Ok(player)
    }

    fn watch_volume(&self, events: &EventSender) {
        for property in ["volume", "mute"] {
            let events = events.clone();
            self.playbin.connect_notify(Some(property), move |_, _| {
                if events.send(PlayerEvent::VolumeChange).is_err() {
                    warn!("Volume change after event channel closed");
                }
            });
        }
    }

    fn listen_to_bus(&self, events: EventSender) -> Result<JoinHandle<()>, App> {
        let bus = self
            .playbin
            .bus()
            .ok_or_else(|| App::Element("Failed to get GStreamer bus".to_string()))?;
        let playbin = self.playbin.clone();
        let error_slot = Arc::clone(&self.error);

        Ok(task::spawn(async move {
            let mut messages = bus.stream();
            while let Some(msg) = messages.next().await {
                let event = match msg.view() {
                    MessageView::Eos(_) => {
                        info!("EOS message received.");
                        Some(PlayerEvent::Ended)
                    }
                    MessageView::Error(err) => {
                        error!("Error from GStreamer pipeline: {}", err.error());
                        let media_error = media_error(&err.error());
                        if let Ok(mut slot) = error_slot.lock() {
                            *slot = Some(media_error);
                        }
                        Some(PlayerEvent::Error)
                    }
                    MessageView::StateChanged(change)
                        if msg.src() == Some(playbin.upcast_ref::<gstreamer::Object>()) =>
                    {
                        match (change.old(), change.current()) {
                            (old, State::Playing) if old != State::Playing => {
                                Some(PlayerEvent::Playing)
                            }
                            (State::Playing, State::Paused) => Some(PlayerEvent::Pause),
                            _ => None,
                        }
                    }
                    _ => None,
                };
                if let Some(event) = event {
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
        }))
    }

    fn start_time_updates(&self, events: EventSender, period: Duration) -> JoinHandle<()> {
        let playbin = self.playbin.clone();
        task::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if playbin.current_state() == State::Playing
                    && events.send(PlayerEvent::TimeUpdate).is_err()
                {
                    break;
                }
            }
        })
    }

    fn clear_error(&self) {
        if let Ok(mut slot) = self.error.lock() {
            *slot = None;
        }
    }

    fn stop_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Maps a GStreamer error onto media-element error codes.
fn media_error(error: &glib::Error) -> MediaError {
    let code = if error.matches(gstreamer::ResourceError::NotFound)
        || error.matches(gstreamer::StreamError::TypeNotFound)
        || error.matches(gstreamer::StreamError::CodecNotFound)
        || error.matches(gstreamer::CoreError::MissingPlugin)
    {
        MediaError::SRC_NOT_SUPPORTED
    } else if error.is::<gstreamer::ResourceError>() {
        MediaError::NETWORK
    } else if error.is::<gstreamer::StreamError>() {
        MediaError::DECODE
    } else {
        MediaError::ABORTED
    };
    MediaError {
        code,
        message: error.message().to_string(),
    }
}

/// Converts a seek time in seconds to a pipeline position. Negative times
/// clamp to zero; times beyond what the pipeline clock can hold are rejected.
fn seek_position(seconds: f64) -> Result<ClockTime, App> {
    let duration = Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|e| App::InvalidInput(format!("seek time {seconds} out of range: {e}")))?;
    let nanos = u64::try_from(duration.as_nanos())
        .ok()
        .filter(|nanos| *nanos <= ClockTime::MAX.nseconds())
        .ok_or_else(|| App::InvalidInput(format!("seek time {seconds} out of range")))?;
    Ok(ClockTime::from_nseconds(nanos))
}

/// URIs pass through; anything else is taken as a local path.
fn to_uri(src: &str) -> Result<String, App> {
    if src.contains("://") {
        return Ok(src.to_string());
    }
    let path = std::path::absolute(src)?;
    glib::filename_to_uri(&path, None)
        .map(|uri| uri.to_string())
        .map_err(|e| App::InvalidInput(format!("invalid source {src}: {e}")))
}

impl MediaPlayer for GstPlayer {
    fn play(&mut self) -> Result<(), App> {
        self.playbin.set_state(State::Playing)?;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), App> {
        self.playbin.set_state(State::Paused)?;
        Ok(())
    }

    fn source(&self) -> Vec<MediaSource> {
        self.sources.clone()
    }

    fn set_source(&mut self, sources: Vec<MediaSource>) -> Result<(), App> {
        let first = sources
            .first()
            .ok_or_else(|| App::InvalidInput("empty source list".to_string()))?;
        let uri = to_uri(&first.src)?;

        self.playbin.set_state(State::Null)?;
        self.playbin.set_property("uri", uri.as_str());
        self.clear_error();
        info!("Source set to {}", uri);
        self.sources = sources;
        self.playbin.set_state(State::Paused)?;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn current_time(&self) -> f64 {
        self.playbin
            .query_position::<ClockTime>()
            .map_or(0.0, |position| position.mseconds() as f64 / 1000.0)
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), App> {
        let position = seek_position(seconds)?;
        self.playbin
            .seek_simple(SeekFlags::FLUSH | SeekFlags::KEY_UNIT, position)?;
        Ok(())
    }

    fn muted(&self) -> bool {
        self.playbin.property::<bool>("mute")
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), App> {
        self.playbin.set_property("mute", muted);
        Ok(())
    }

    fn volume(&self) -> f64 {
        self.playbin.property::<f64>("volume")
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), App> {
        self.playbin.set_property("volume", volume.clamp(0.0, 1.0));
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        // playbin picks its own video sink window; there is no fullscreen toggle to observe
        false
    }

    fn error(&self) -> Option<MediaError> {
        self.error.lock().ok().and_then(|slot| slot.clone())
    }

    fn dispose(&mut self) -> Result<(), App> {
        self.stop_tasks();
        self.playbin.set_state(State::Null)?;
        self.sources.clear();
        info!("Player disposed");
        Ok(())
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        self.stop_tasks();
        if let Err(e) = self.playbin.set_state(State::Null) {
            error!("Failed to release pipeline: {}", e);
        }
    }
}
