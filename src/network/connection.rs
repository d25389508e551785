//! Handle to the single transport owned by the control connection.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::frame::events::EventPayload;

/// Default wire-protocol version attempted first; lowered on negotiation
/// errors, one step at a time, never below 1.
pub const DEFAULT_PROTOCOL_VERSION: u8 = 3;

const DEFAULT_PORT: u16 = 9042;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options shared by every connection attempt.
///
/// `protocol_version` is the one mutable field, and it only ever decreases:
/// the control connection lowers it when a node rejects the negotiation with
/// a protocol error. The atomic makes that mutation's visibility explicit;
/// a connector holding the same `Arc` sees the downgrade on its next attempt.
#[derive(Debug)]
pub struct ConnectionOptions {
    protocol_version: AtomicU8,
    port: u16,
    connect_timeout: Duration,
}

impl ConnectionOptions {
    pub fn new(protocol_version: u8) -> Self {
        ConnectionOptions {
            protocol_version: AtomicU8::new(protocol_version.max(1)),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version.load(Ordering::SeqCst)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Lowers the protocol version by one step, never below 1. Returns the new
    /// version, or `None` if the floor was already reached.
    pub(crate) fn downgrade_protocol_version(&self) -> Option<u8> {
        self.protocol_version
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |version| {
                (version > 1).then(|| version - 1)
            })
            .ok()
            .map(|previous| previous - 1)
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions::new(DEFAULT_PROTOCOL_VERSION)
    }
}

/// An established transport, produced by a [`Connector`].
///
/// The control connection holds at most one of these at a time. The connector
/// drives the handle from the transport side: [`push_event`] delivers raw
/// server events, [`notify_closed`] fires once when the transport dies. The
/// owning side consumes events through [`take_event_receiver`] (once) and
/// observes transport death through [`wait_closed`].
///
/// [`Connector`]: crate::network::Connector
/// [`push_event`]: Connection::push_event
/// [`notify_closed`]: Connection::notify_closed
/// [`take_event_receiver`]: Connection::take_event_receiver
/// [`wait_closed`]: Connection::wait_closed
#[derive(Debug)]
pub struct Connection {
    host: IpAddr,
    connected: AtomicBool,
    closed_tx: watch::Sender<bool>,
    events_tx: mpsc::UnboundedSender<EventPayload>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<EventPayload>>>,
}

impl Connection {
    pub fn new(host: IpAddr) -> Arc<Self> {
        let (closed_tx, _) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Connection {
            host,
            connected: AtomicBool::new(true),
            closed_tx,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    /// Address of the node this transport is connected to.
    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Marks the transport as dead and wakes every [`wait_closed`] waiter.
    /// Idempotent; only the first call changes anything.
    ///
    /// [`wait_closed`]: Connection::wait_closed
    pub fn notify_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed_tx.send_replace(true);
    }

    /// Resolves once the transport has died. Resolves immediately if it
    /// already has.
    pub async fn wait_closed(&self) {
        let mut closed = self.closed_tx.subscribe();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                return;
            }
        }
    }

    /// Delivers a raw server event. Events pushed before the receiver is
    /// taken are buffered; events pushed after the control connection went
    /// away are dropped.
    pub fn push_event(&self, payload: EventPayload) {
        let _ = self.events_tx.send(payload);
    }

    /// Hands out the event receiver. The first caller gets it; there is one
    /// event subscription per connection.
    pub(crate) fn take_event_receiver(
        &self,
    ) -> Option<mpsc::UnboundedReceiver<EventPayload>> {
        self.events_rx.lock().unwrap().take()
    }
}
