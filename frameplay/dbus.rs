use log::{error, info, trace, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use zbus::names::{BusName, InterfaceName, MemberName};
use zbus::zvariant::ObjectPath;
use zbus::{fdo, interface, Connection, ConnectionBuilder};

use crate::config;
use crate::error::App;
use crate::events::ParentWindow;

pub const INTERFACE: &str = "org.frameplay.Player";
pub const EVENT_SIGNAL: &str = "Event";

/// How long queued events may take to reach the parent once stopping.
const FORWARD_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct PlayerDBus {
    tx: mpsc::Sender<String>,
    stop_signal: watch::Sender<()>,
}

#[interface(name = "org.frameplay.Player")]
impl PlayerDBus {
    async fn test_connection(&self) -> fdo::Result<()> {
        Ok(())
    }

    /// Queues a raw `player-api-command://` string for the player.
    async fn post_message(&self, message: String) -> fdo::Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|e| fdo::Error::Failed(format!("player is gone: {e}")))
    }

    async fn quit(&self) -> fdo::Result<()> {
        self.stop_signal
            .send(())
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }
}

/// Parent window reached over the session bus.
///
/// Posts are queued and emitted as `Event` signals addressed to the parent
/// by [`run_dbus_server`].
#[derive(Debug, Clone)]
pub struct DbusParent {
    parent: Option<String>,
    tx: mpsc::UnboundedSender<String>,
}

impl DbusParent {
    pub fn new(parent: Option<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { parent, tx }, rx)
    }
}

impl ParentWindow for DbusParent {
    fn is_embedded(&self) -> bool {
        self.parent.is_some()
    }

    fn post_message(&self, message: String) -> Result<(), App> {
        self.tx.send(message)?;
        Ok(())
    }
}

#[derive(Clone)]
struct SignalTarget {
    destination: BusName<'static>,
    path: ObjectPath<'static>,
    interface: InterfaceName<'static>,
    member: MemberName<'static>,
}

impl SignalTarget {
    fn new(parent: &str, path: &str) -> Result<Self, App> {
        Ok(Self {
            destination: BusName::try_from(parent)?.into_owned(),
            path: ObjectPath::try_from(path)?.into_owned(),
            interface: InterfaceName::try_from(INTERFACE)?,
            member: MemberName::try_from(EVENT_SIGNAL)?,
        })
    }

    async fn emit(&self, connection: &Connection, payload: &str) -> Result<(), App> {
        connection
            .emit_signal(
                Some(self.destination.clone()),
                self.path.clone(),
                self.interface.clone(),
                self.member.clone(),
                &payload,
            )
            .await?;
        Ok(())
    }
}

/// Emits every queued payload until all senders are gone.
async fn forward_outbound<F, Fut>(mut outbound: mpsc::UnboundedReceiver<String>, mut emit: F)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), App>>,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = emit(payload).await {
            error!("Failed to emit event to parent: {}", e);
        }
    }
}

/// Waits up to `grace` for the forwarder to drain, then aborts it.
/// Returns true when it finished on its own.
async fn finish_forwarding(mut forwarder: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut forwarder).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Event forwarder failed: {}", e);
            false
        }
        Err(_) => {
            warn!("Event forwarder still busy after {:?}, dropping the rest", grace);
            forwarder.abort();
            false
        }
    }
}

/// Serves the player interface until `stop_signal` fires.
pub async fn run_dbus_server(
    bus: &config::Bus,
    parent: Option<&str>,
    command_sender: mpsc::Sender<String>,
    outbound: mpsc::UnboundedReceiver<String>,
    stop_signal: watch::Sender<()>,
) -> Result<(), App> {
    let target = parent
        .map(|parent| SignalTarget::new(parent, &bus.path))
        .transpose()?;

    let player_dbus = PlayerDBus {
        tx: command_sender,
        stop_signal: stop_signal.clone(),
    };

    let connection = ConnectionBuilder::session()?
        .name(bus.name.as_str())?
        .serve_at(bus.path.as_str(), player_dbus)?
        .build()
        .await?;
    info!("Serving {} at {} as {}", INTERFACE, bus.path, bus.name);

    let signal_connection = connection.clone();
    let forwarder = tokio::spawn(forward_outbound(outbound, move |payload| {
        let connection = signal_connection.clone();
        let target = target.clone();
        async move {
            match target {
                Some(target) => target.emit(&connection, &payload).await,
                None => {
                    trace!("No parent configured, dropping {}", payload);
                    Ok(())
                }
            }
        }
    }));

    let mut stop_receiver = stop_signal.subscribe();

    // Wait for the stop signal
    tokio::select! {
        _ = stop_receiver.changed() => {
            info!("Stop signal received, shutting down DBus server...");
        }
    }

    if finish_forwarding(forwarder, FORWARD_GRACE).await {
        info!("Queued events delivered");
    }
    Ok(())
}
