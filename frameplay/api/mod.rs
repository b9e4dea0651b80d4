//! Inbound command path: raw message strings → [`Message`] → player calls.

pub mod handler;
pub mod listener;

pub use handler::{Command, Handler};
pub use listener::receive_message;

use serde::Serialize;
use serde_json::{Map, Value};

/// A command message with the `player:` prefix already stripped.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Message {
    #[serde(rename = "type")]
    pub type_name: String,
    pub data: Map<String, Value>,
}
