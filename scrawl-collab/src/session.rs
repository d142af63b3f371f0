//! The sync session: one dispatcher between the link and the scene.
//!
//! Holds no state of its own beyond handles: the store is the single
//! source of truth, the session decides what each inbound message does to
//! it and what goes back out. Inbound messages arrive serialized by the
//! single receive loop, so every handler runs to completion before the
//! next one starts.
//!
//! ```text
//! local edit ──► send_object ──┬──► ResponseObject ──► peer
//!                              └──► SceneStore::append
//!
//! peer ──► Message ──► handle() ──► SceneStore mutation
//!                          │
//!                          └──► SessionEvent ──► presentation
//! ```
//!
//! Local edits are fire-and-forget broadcasts: the sender appends its own
//! copy and does not wait for acknowledgement. Edits made while the link
//! is down stay local-only.

use std::sync::Arc;

use scrawl_core::{codec, SceneStore, Shape, WireFormat};
use tokio::sync::mpsc;

use crate::protocol::{Message, TaggedShape, WireError};

/// Notifications pushed to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The scene changed; redraw from this snapshot.
    SceneChanged(Vec<Shape>),
    /// The peer answered `RequestObjectListSize`.
    ListSize(usize),
    /// The peer answered `RequestObjectList`. Informational: the scene is
    /// not mutated (reserved for a future bulk replace).
    ListReceived(Vec<Shape>),
    /// The link is gone. The local scene is preserved.
    Disconnected,
}

/// Pure dispatcher between link and scene.
#[derive(Clone)]
pub struct SyncSession {
    store: Arc<SceneStore>,
    outbound: mpsc::Sender<Message>,
    events: mpsc::Sender<SessionEvent>,
    format: WireFormat,
}

impl SyncSession {
    /// Build a session over an established link. Shape payloads are
    /// encoded as JSON unless [`with_format`](Self::with_format) says
    /// otherwise; decode always follows the sender's explicit tag.
    pub fn new(
        store: Arc<SceneStore>,
        outbound: mpsc::Sender<Message>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            store,
            outbound,
            events,
            format: WireFormat::Json,
        }
    }

    pub fn with_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    pub fn store(&self) -> &Arc<SceneStore> {
        &self.store
    }

    /// Dispatch one inbound message. Every protocol violation is logged
    /// and contained, never propagated as a crash.
    pub async fn handle(&self, msg: Message) {
        match msg {
            Message::ClearObjects => {
                self.store.clear();
                self.scene_changed().await;
            }
            Message::ResponseObject { tag, payload } => {
                match codec::decode(&tag, &payload, self.format) {
                    Ok(shape) => {
                        self.store.append(shape);
                        self.scene_changed().await;
                    }
                    Err(e) => log::warn!("Dropping undecodable {tag} object: {e}"),
                }
            }
            Message::ResponseObjectByIndex { index, tag, payload } => {
                match codec::decode(&tag, &payload, self.format) {
                    Ok(shape) => match self.store.replace_at(index as usize, shape) {
                        Ok(()) => self.scene_changed().await,
                        // Stale index from the peer: protocol violation,
                        // ignore rather than crash.
                        Err(e) => log::warn!("Ignoring replace: {e}"),
                    },
                    Err(e) => log::warn!("Dropping undecodable {tag} object: {e}"),
                }
            }
            Message::ResponseObjectListSize { size } => {
                log::debug!("Peer reports {size} objects");
                self.emit(SessionEvent::ListSize(size as usize)).await;
            }
            Message::ResponseObjectList { objects } => {
                log::debug!("Peer echoed {} objects", objects.len());
                let mut shapes = Vec::with_capacity(objects.len());
                for (tag, payload) in &objects {
                    match codec::decode(tag, payload, self.format) {
                        Ok(shape) => shapes.push(shape),
                        Err(e) => log::warn!("Skipping undecodable {tag} in list: {e}"),
                    }
                }
                self.emit(SessionEvent::ListReceived(shapes)).await;
            }
            Message::RequestObjectList => self.send_object_list().await,
            Message::RequestObjectListSize => self.send_object_list_size().await,
            Message::RequestObjectByIndex { index } => {
                match self.store.shape_at(index as usize) {
                    Some(shape) => self.send_object_by_index(index, &shape).await,
                    // Misbehaving peer: decline to reply rather than crash.
                    None => log::warn!(
                        "Peer requested object {index} of {}",
                        self.store.count()
                    ),
                }
            }
        }
    }

    /// Reply to `RequestObjectList` with every current shape.
    async fn send_object_list(&self) {
        match self.encode_snapshot() {
            Ok(objects) => self.send(Message::ResponseObjectList { objects }).await,
            Err(e) => log::error!("Cannot encode scene for list reply: {e}"),
        }
    }

    /// Reply to `RequestObjectListSize` with the current count.
    async fn send_object_list_size(&self) {
        let size = self.store.count() as u32;
        self.send(Message::ResponseObjectListSize { size }).await;
    }

    /// Reply to `RequestObjectByIndex` with the shape at that position.
    async fn send_object_by_index(&self, index: u32, shape: &Shape) {
        match self.encode_shape(shape) {
            Ok((tag, payload)) => {
                self.send(Message::ResponseObjectByIndex { index, tag, payload }).await;
            }
            Err(e) => log::error!("Cannot encode object {index}: {e}"),
        }
    }

    /// Broadcast a local edit and append it to the local scene.
    pub async fn send_object(&self, shape: Shape) -> Result<(), WireError> {
        let (tag, payload) = self.encode_shape(&shape)?;
        self.send(Message::ResponseObject { tag, payload }).await;
        self.store.append(shape);
        self.scene_changed().await;
        Ok(())
    }

    /// Clear both scenes: send `ClearObjects`, empty the local store.
    pub async fn clear_objects(&self) {
        self.send(Message::ClearObjects).await;
        self.store.clear();
        self.scene_changed().await;
    }

    /// Pull the peer's full scene; the reply arrives as
    /// [`SessionEvent::ListReceived`].
    pub async fn request_object_list(&self) {
        self.send(Message::RequestObjectList).await;
    }

    /// Pull the peer's shape count; the reply arrives as
    /// [`SessionEvent::ListSize`].
    pub async fn request_object_list_size(&self) {
        self.send(Message::RequestObjectListSize).await;
    }

    /// Pull one shape by index. Index validity against the last known
    /// count is the caller's responsibility.
    pub async fn request_object_by_index(&self, index: u32) {
        self.send(Message::RequestObjectByIndex { index }).await;
    }

    /// Called by the receive loop when the link terminates.
    pub async fn link_closed(&self) {
        self.emit(SessionEvent::Disconnected).await;
    }

    fn encode_shape(&self, shape: &Shape) -> Result<TaggedShape, WireError> {
        let payload = codec::encode(shape, self.format)?;
        Ok((shape.type_tag().to_string(), payload))
    }

    fn encode_snapshot(&self) -> Result<Vec<TaggedShape>, WireError> {
        self.store
            .snapshot()
            .iter()
            .map(|shape| self.encode_shape(shape))
            .collect()
    }

    async fn send(&self, msg: Message) {
        // A closed channel means the link is down; the edit stays local.
        if self.outbound.send(msg).await.is_err() {
            log::debug!("Link down, keeping edit local");
        }
    }

    async fn scene_changed(&self) {
        self.emit(SessionEvent::SceneChanged(self.store.snapshot())).await;
    }

    async fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event).await;
    }
}
