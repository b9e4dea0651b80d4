use flexi_logger::FlexiLoggerError;
use std::io;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio::task::JoinError;
use zbus::Error as ZbusError;

#[derive(Error, Debug, Clone)]
pub enum App {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("TOML parsing error: {0}")]
    TomlParsing(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Logger initialization error: {0}")]
    Logger(String),

    #[error("Channel send error: {0}")]
    Send(String),

    #[error("Join task error: {0}")]
    JoinTask(String),

    #[error("ZBus error: {0}")]
    ZBus(String),

    #[error("GStreamer initialization error: {0}")]
    Init(String),

    #[error("GStreamer element error: {0}")]
    Element(String),

    #[error("GStreamer state error: {0}")]
    State(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Player error: {0}")]
    Player(String),
}

impl From<io::Error> for App {
    fn from(error: io::Error) -> Self {
        App::Io(error.to_string())
    }
}

impl From<toml::de::Error> for App {
    fn from(error: toml::de::Error) -> Self {
        App::TomlParsing(error.to_string())
    }
}

impl From<serde_json::Error> for App {
    fn from(error: serde_json::Error) -> Self {
        App::Json(error.to_string())
    }
}

impl From<FlexiLoggerError> for App {
    fn from(error: FlexiLoggerError) -> Self {
        App::Logger(error.to_string())
    }
}

impl<T> From<SendError<T>> for App {
    fn from(error: SendError<T>) -> Self {
        App::Send(error.to_string())
    }
}

impl From<JoinError> for App {
    fn from(error: JoinError) -> Self {
        App::JoinTask(error.to_string())
    }
}

impl From<ZbusError> for App {
    fn from(error: ZbusError) -> Self {
        App::ZBus(error.to_string())
    }
}

impl From<zbus::names::Error> for App {
    fn from(error: zbus::names::Error) -> Self {
        App::ZBus(error.to_string())
    }
}

impl From<zbus::zvariant::Error> for App {
    fn from(error: zbus::zvariant::Error) -> Self {
        App::ZBus(error.to_string())
    }
}

#[cfg(feature = "gst")]
impl From<glib::BoolError> for App {
    fn from(error: glib::BoolError) -> Self {
        App::Player(format!(
            "Failed to perform an operation on GStreamer pipeline: {error}"
        ))
    }
}

#[cfg(feature = "gst")]
impl From<gstreamer::StateChangeError> for App {
    fn from(error: gstreamer::StateChangeError) -> Self {
        App::State(error.to_string())
    }
}
