//! Player events and their forwarding to the embedder.
//!
//! - [`PlayerEvent`] is what a player backend (and the command facade) raise
//! - [`subscriber::Subscriber`] maps events to outbound event names and data
//! - [`emitter::Emitter`] wraps them in envelopes and posts them to the parent

pub mod emitter;
pub mod subscriber;

pub use emitter::{Emitter, ParentWindow};
pub use subscriber::Subscriber;

use tokio::sync::mpsc;

/// Events observed on the player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The player is loaded and ready to take commands.
    Ready,
    Playing,
    Pause,
    Ended,
    TimeUpdate,
    FullscreenChange,
    VolumeChange,
    /// A native playback error; details are read from [`crate::player::MediaPlayer::error`].
    Error,
    /// Raised by the command facade when a message could not be handled.
    ManagementError(ManagementError),
}

/// Payload of a facade-raised error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagementError {
    pub code: Option<i64>,
    pub text: Option<String>,
}

pub type EventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
