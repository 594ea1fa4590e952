use serde_json::Value;
use tabshelf_core::{Broadcast, Error, Response, Result};
use tokio::sync::{broadcast, mpsc, oneshot};

/// A raw `{type, ...}` message waiting for dispatch. `reply` is `None` for
/// fire-and-forget senders.
#[derive(Debug)]
pub struct InboundMessage {
    pub payload: Value,
    pub reply: Option<oneshot::Sender<Response>>,
}

impl InboundMessage {
    pub fn request(payload: Value) -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                payload,
                reply: Some(tx),
            },
            rx,
        )
    }

    pub fn notify(payload: Value) -> Self {
        Self {
            payload,
            reply: None,
        }
    }
}

pub struct MessageBus {
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub inbound_rx: mpsc::Receiver<InboundMessage>,
    pub broadcast_tx: broadcast::Sender<Broadcast>,
}

impl MessageBus {
    pub fn new(buffer_size: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size);
        let (broadcast_tx, _) = broadcast::channel(buffer_size);
        Self {
            inbound_tx,
            inbound_rx,
            broadcast_tx,
        }
    }

    pub fn client(&self) -> BusClient {
        BusClient {
            inbound: self.inbound_tx.clone(),
            broadcasts: self.broadcast_tx.clone(),
        }
    }

    pub fn split(
        self,
    ) -> (
        (mpsc::Sender<InboundMessage>, mpsc::Receiver<InboundMessage>),
        broadcast::Sender<Broadcast>,
    ) {
        ((self.inbound_tx, self.inbound_rx), self.broadcast_tx)
    }
}

/// Sending side of the bus as seen by a UI surface.
#[derive(Clone)]
pub struct BusClient {
    inbound: mpsc::Sender<InboundMessage>,
    broadcasts: broadcast::Sender<Broadcast>,
}

impl BusClient {
    /// Send one message and wait for its envelope. `None` means the message
    /// named no known command and was ignored.
    pub async fn request(&self, payload: Value) -> Result<Option<Response>> {
        let (message, reply) = InboundMessage::request(payload);
        self.inbound
            .send(message)
            .await
            .map_err(|_| Error::Other("dispatcher is not running".to_string()))?;
        Ok(reply.await.ok())
    }

    pub async fn notify(&self, payload: Value) -> Result<()> {
        self.inbound
            .send(InboundMessage::notify(payload))
            .await
            .map_err(|_| Error::Other("dispatcher is not running".to_string()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcasts.subscribe()
    }
}
