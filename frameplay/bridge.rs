use log::info;
use tokio::sync::{mpsc, watch};

use crate::api::{receive_message, Handler};
use crate::events::{Emitter, EventReceiver, EventSender, ParentWindow, PlayerEvent, Subscriber};
use crate::player::MediaPlayer;

/// The host loop: owns the player, feeds it commands and forwards its events.
#[derive(Debug)]
pub struct Bridge<P, W> {
    player: P,
    handler: Handler,
    subscriber: Subscriber,
    emitter: Emitter<W>,
}

impl<P: MediaPlayer, W: ParentWindow> Bridge<P, W> {
    /// `events` must be the sender the player reports on, so that facade
    /// errors and player events share one ordered stream.
    pub fn new(player: P, window: W, events: EventSender) -> Self {
        Self {
            player,
            handler: Handler::new(events),
            subscriber: Subscriber::new(),
            emitter: Emitter::new(window),
        }
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> &P {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn emitter(&self) -> &Emitter<W> {
        &self.emitter
    }

    pub fn is_removed(&self) -> bool {
        self.handler.is_disposed()
    }

    /// Handles one raw posted string.
    pub fn handle_message(&mut self, raw: &str) {
        if let Some(message) = receive_message(raw) {
            self.handler.facade(&mut self.player, &message);
        }
    }

    /// Forwards one player event to the parent window.
    pub fn handle_event(&mut self, event: &PlayerEvent) {
        for (name, data) in self.subscriber.translate(&self.player, event) {
            self.emitter.trigger_message(name, data);
        }
    }

    /// Runs until the player is removed, the inbound side closes or `stop`
    /// fires. Pending player events are forwarded before the next command.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<String>,
        mut events: EventReceiver,
        mut stop: watch::Receiver<()>,
    ) -> Self {
        loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.handle_event(&event),
                raw = inbound.recv() => {
                    let Some(raw) = raw else {
                        info!("Inbound message channel closed");
                        break;
                    };
                    self.handle_message(&raw);
                    if self.is_removed() {
                        info!("Player removed, leaving host loop");
                        break;
                    }
                }
                _ = stop.changed() => {
                    info!("Stop signal received, leaving host loop...");
                    break;
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, emitter::mock::MockWindow};
    use crate::player::mock::{Call, MockPlayer};
    use serde_json::{json, Value};

    fn posted_values(bridge: &Bridge<MockPlayer, MockWindow>) -> Vec<Value> {
        bridge
            .emitter()
            .window()
            .posted()
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }

    #[test]
    fn seek_command_posts_nothing_until_time_update() {
        let (tx, mut rx) = events::channel();
        let mut bridge = Bridge::new(MockPlayer::default(), MockWindow::embedded(), tx);

        bridge.handle_message(
            r#"player-api-command://{"type":"player:setCurrentTime","data":{"time":42}}"#,
        );
        assert_eq!(bridge.player().calls, vec![Call::SetCurrentTime(42.0)]);
        assert!(bridge.emitter().window().posted().is_empty());
        assert!(rx.try_recv().is_err());

        bridge.handle_event(&PlayerEvent::TimeUpdate);
        assert_eq!(
            posted_values(&bridge),
            vec![json!({"type": "player:currentTime", "data": {"time": 42.0}})]
        );
    }

    #[test]
    fn top_level_host_forwards_nothing() {
        let (tx, _rx) = events::channel();
        let mut bridge = Bridge::new(MockPlayer::default(), MockWindow::top_level(), tx);
        for event in [
            PlayerEvent::Ready,
            PlayerEvent::Playing,
            PlayerEvent::Ended,
            PlayerEvent::Error,
        ] {
            bridge.handle_event(&event);
        }
        assert!(bridge.emitter().window().posted().is_empty());
    }

    #[test]
    fn unprefixed_strings_reach_no_handler() {
        let (tx, mut rx) = events::channel();
        let mut bridge = Bridge::new(MockPlayer::default(), MockWindow::embedded(), tx);
        bridge.handle_message(r#"{"type":"player:play"}"#);
        bridge.handle_message(r#"player-api-command://{"type":"play"}"#);
        assert!(bridge.player().calls.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_forwards_events_and_ends_on_remove() {
        let (events_tx, events_rx) = events::channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let (_stop_tx, stop_rx) = watch::channel(());
        let bridge = Bridge::new(MockPlayer::default(), MockWindow::embedded(), events_tx.clone());

        events_tx.send(PlayerEvent::Ready).unwrap();
        for raw in [
            r#"player-api-command://{"type":"player:setCurrentTime","data":{"time":42}}"#,
            r#"player-api-command://{"type":"player:explode"}"#,
            r#"player-api-command://{"type":"player:remove"}"#,
            r#"player-api-command://{"type":"player:play"}"#,
        ] {
            inbound_tx.send(raw.to_string()).await.unwrap();
        }

        let bridge = bridge.run(inbound_rx, events_rx, stop_rx).await;

        assert!(bridge.is_removed());
        assert_eq!(
            bridge.player().calls,
            vec![Call::SetCurrentTime(42.0), Call::Dispose]
        );
        assert_eq!(
            posted_values(&bridge),
            vec![
                json!({"type": "player:ready", "data": {}}),
                json!({
                    "type": "player:error",
                    "data": {
                        "reason": "management",
                        "code": 1,
                        "text": r#"wrong message: {"type":"explode","data":{}}"#
                    }
                }),
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_on_signal() {
        let (events_tx, events_rx) = events::channel();
        let (_inbound_tx, inbound_rx) = mpsc::channel::<String>(1);
        let (stop_tx, stop_rx) = watch::channel(());
        let bridge = Bridge::new(MockPlayer::default(), MockWindow::embedded(), events_tx);

        stop_tx.send(()).unwrap();
        let bridge = bridge.run(inbound_rx, events_rx, stop_rx).await;
        assert!(!bridge.is_removed());
        assert!(bridge.player().calls.is_empty());
    }
}
