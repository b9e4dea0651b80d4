#[cfg(feature = "gst")]
pub mod gst_logic;

#[cfg(feature = "gst")]
pub use gst_logic::GstPlayer;

use crate::error::App;
use serde::{Deserialize, Serialize};

/// One entry of a player source list, `{src, type}` as media libraries write it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MediaSource {
    pub src: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl MediaSource {
    pub fn url(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            mime_type: None,
        }
    }
}

/// Shapes accepted for a source: a bare URL, one object, or a list of objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceSpec {
    Url(String),
    One(MediaSource),
    Many(Vec<MediaSource>),
}

/// True for the values a script would treat as false: `null`, `false`, `0`
/// and `""`.
fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(flag) => !flag,
        serde_json::Value::Number(number) => number.as_f64() == Some(0.0),
        serde_json::Value::String(text) => text.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}

/// Reads a source value into a source list.
///
/// Falsy values and an empty list are "no source" and yield `Ok(None)`; any
/// other shape that is not a source is an error.
pub fn parse_sources(value: &serde_json::Value) -> Result<Option<Vec<MediaSource>>, App> {
    if is_falsy(value) {
        return Ok(None);
    }
    let spec: SourceSpec = serde_json::from_value(value.clone())
        .map_err(|e| App::InvalidInput(format!("invalid source: {e}")))?;
    let sources = match spec {
        SourceSpec::Url(url) => vec![MediaSource::url(url)],
        SourceSpec::One(source) => vec![source],
        SourceSpec::Many(sources) => sources,
    };
    let sources: Vec<MediaSource> = sources
        .into_iter()
        .filter(|source| !source.src.is_empty())
        .collect();
    Ok((!sources.is_empty()).then_some(sources))
}

/// Error held by the player after a failed playback, with media-element codes.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaError {
    pub code: u16,
    pub message: String,
}

impl MediaError {
    pub const ABORTED: u16 = 1;
    pub const NETWORK: u16 = 2;
    pub const DECODE: u16 = 3;
    pub const SRC_NOT_SUPPORTED: u16 = 4;
}

/// The player driven by commands and observed for events.
///
/// Implementations report their own state changes through the event sender
/// they were built with; the methods here only read and write state.
pub trait MediaPlayer {
    fn play(&mut self) -> Result<(), App>;
    fn pause(&mut self) -> Result<(), App>;

    /// Current source list, empty when nothing is loaded.
    fn source(&self) -> Vec<MediaSource>;
    /// Loads `sources`, resetting playback position and error state.
    fn set_source(&mut self, sources: Vec<MediaSource>) -> Result<(), App>;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64) -> Result<(), App>;

    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool) -> Result<(), App>;

    /// Volume in the 0–1 range.
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64) -> Result<(), App>;

    fn is_fullscreen(&self) -> bool;
    fn error(&self) -> Option<MediaError>;

    /// Releases the player and everything it holds.
    fn dispose(&mut self) -> Result<(), App>;
}
