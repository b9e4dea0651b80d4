//! Remote control for an embedded media player.
//!
//! An embedder posts `player-api-command://{"type":"player:<command>","data":{..}}`
//! strings to the host. The [`api`] layer validates them and drives a
//! [`player::MediaPlayer`]; the [`events`] layer turns player events into
//! `{"type":"player:<event>","data":{..}}` envelopes posted back to the
//! embedder. [`bridge::Bridge`] ties both halves to a single host loop and
//! [`dbus`] exposes it on the session bus.

pub mod api;
pub mod bridge;
pub mod config;
pub mod dbus;
pub mod envelope;
pub mod error;
pub mod events;
pub mod player;

pub use envelope::{Envelope, COMMAND_SCHEME, TYPE_PREFIX};
pub use error::App;
