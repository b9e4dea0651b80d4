use log::{error, trace};
use serde_json::{Map, Value};

use super::subscriber::EventName;
use crate::envelope::Envelope;
use crate::error::App;

/// The window the player is embedded in.
pub trait ParentWindow {
    /// False when the player runs top-level, with no embedder to talk to.
    fn is_embedded(&self) -> bool;

    /// Delivers one serialised envelope to the embedder.
    fn post_message(&self, message: String) -> Result<(), App>;
}

/// Posts player events to the parent window as envelopes.
#[derive(Debug)]
pub struct Emitter<W> {
    window: W,
}

impl<W: ParentWindow> Emitter<W> {
    pub fn new(window: W) -> Self {
        Self { window }
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> &W {
        &self.window
    }

    pub fn get_message(name: EventName, data: Map<String, Value>) -> Envelope {
        Envelope::prefixed(name.as_str(), data)
    }

    /// Sends `message` to the parent; a top-level window never posts.
    pub fn send_message(&self, message: &Envelope) {
        if !self.window.is_embedded() {
            trace!("Not embedded, dropping {}", message.kind);
            return;
        }
        let result = message
            .to_json()
            .and_then(|json| self.window.post_message(json));
        if let Err(e) = result {
            error!("Failed to post {} to parent: {}", message.kind, e);
        }
    }

    pub fn trigger_message(&self, name: EventName, data: Map<String, Value>) {
        self.send_message(&Self::get_message(name, data));
    }
}
