//! Live-subscriber registry and WebSocket endpoint
//!
//! Subscribers connect over `GET /updates` and receive server-pushed JSON
//! messages; anything they send (other than Close) is ignored. The registry
//! is the only shared mutable state in the process.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Per-subscriber outbound buffer. A subscriber that falls this far behind
/// is treated as dead rather than allowed to stall the broadcast path.
const SUBSCRIBER_BUFFER: usize = 64;

/// Registry of currently connected live-update subscribers
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<Uuid, mpsc::Sender<Value>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Create the outbound channel pair for one subscriber.
    pub fn channel() -> (mpsc::Sender<Value>, mpsc::Receiver<Value>) {
        mpsc::channel(SUBSCRIBER_BUFFER)
    }

    /// Register a subscriber's outbound sender; returns its registry ID.
    ///
    /// Callers must only register after the WebSocket handshake completed.
    pub async fn add(&self, sender: mpsc::Sender<Value>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, sender);
        tracing::info!(subscriber = %id, "Subscriber registered");
        id
    }

    /// Unregister a subscriber. Removing an unknown ID is a no-op.
    pub async fn remove(&self, id: &Uuid) {
        if self.subscribers.write().await.remove(id).is_some() {
            tracing::info!(subscriber = %id, "Subscriber unregistered");
        }
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver `message` to every registered subscriber.
    ///
    /// Delivery is independent per subscriber: a full or closed channel
    /// marks that subscriber dead and it is pruned before this call
    /// returns, without affecting delivery to the others. With zero
    /// subscribers the message is dropped.
    pub async fn broadcast(&self, message: Value) {
        let targets: Vec<(Uuid, mpsc::Sender<Value>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        if targets.is_empty() {
            tracing::debug!("No subscribers connected, dropping update");
            return;
        }

        let mut dead = Vec::new();
        for (id, tx) in targets {
            if let Err(e) = tx.try_send(message.clone()) {
                tracing::warn!(subscriber = %id, "Dropping unreachable subscriber: {}", e);
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &dead {
                subscribers.remove(id);
            }
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle WebSocket upgrade for `GET /updates`.
pub async fn handle_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<crate::api::AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.registry.clone()))
}

/// Drive one subscriber connection until it closes or its send side fails.
async fn handle_socket(socket: WebSocket, registry: Arc<SubscriberRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = SubscriberRegistry::channel();
    let id = registry.add(tx).await;

    let send_task = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            let text = match serde_json::to_string(&update) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping unserializable update: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Subscribers are push-only; inbound frames are drained and ignored
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    registry.remove(&id).await;
    tracing::info!(subscriber = %id, "WebSocket subscriber disconnected");
}
