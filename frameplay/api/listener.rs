use log::{debug, warn};
use serde_json::{Map, Value};

use super::Message;
use crate::envelope::{COMMAND_SCHEME, TYPE_PREFIX};

/// Strips [`TYPE_PREFIX`] from `type_name`, or `None` when it is not there.
pub fn get_type_name(type_name: &Value) -> Option<&str> {
    type_name.as_str()?.strip_prefix(TYPE_PREFIX)
}

/// Builds a [`Message`] from a decoded envelope object.
///
/// Missing or non-object `data` becomes an empty object.
pub fn get_message(envelope: &Map<String, Value>) -> Option<Message> {
    let type_name = get_type_name(envelope.get("type")?)?;
    let data = match envelope.get("data") {
        Some(Value::Object(data)) => data.clone(),
        _ => Map::new(),
    };
    Some(Message {
        type_name: type_name.to_string(),
        data,
    })
}

/// Decodes a raw posted string addressed to the player.
///
/// Strings without [`COMMAND_SCHEME`] belong to someone else and are skipped
/// silently; undecodable payloads are logged and dropped.
pub fn receive_message(raw: &str) -> Option<Message> {
    let Some(payload) = raw.strip_prefix(COMMAND_SCHEME) else {
        debug!("Ignoring message without command scheme");
        return None;
    };
    let envelope = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(envelope)) => envelope,
        Ok(other) => {
            warn!("Command payload is not an object: {}", other);
            return None;
        }
        Err(e) => {
            warn!("Failed to parse command payload: {}", e);
            return None;
        }
    };
    let message = get_message(&envelope);
    if message.is_none() {
        warn!("Command payload has no player type: {}", payload);
    }
    message
}
