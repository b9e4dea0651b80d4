use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix carried by every command type and every event type.
pub const TYPE_PREFIX: &str = "player:";

/// Scheme that marks a raw message string as addressed to the player.
pub const COMMAND_SCHEME: &str = "player-api-command://";

/// The `{type, data}` object exchanged with the embedder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Builds an envelope for `name`, adding [`TYPE_PREFIX`].
    pub fn prefixed(name: &str, data: Map<String, Value>) -> Self {
        Self {
            kind: format!("{TYPE_PREFIX}{name}"),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, crate::App> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Converts a `json!({...})` literal into a data map, dropping anything that
/// is not an object.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
