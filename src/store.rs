//! Card store: the canvas engine boundary.
//!
//! Pipelines and controllers only ever read-check-then-write through
//! [`CardStore::update`], which runs the merge closure under one lock so every
//! partial update lands atomically. [`MemoryStore`] is the in-process store;
//! a rendering layer observes it through [`MemoryStore::subscribe`].
//!
//! Update events carry only the card id and its new revision; observers read
//! the card back when they need it, so a streamed batch never copies the
//! table.

use crate::types::{Bounds, Camera, Card, CardId};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Capacity of the store event channel
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Committed change, published after the lock is released.
#[derive(Clone, Debug)]
pub enum StoreEvent {
    Created(Card),
    Updated { id: CardId, revision: u64 },
    Removed(CardId),
    CameraMoved { camera: Camera, animate_ms: u64 },
}

/// Operations consumed from the canvas engine.
pub trait CardStore: Send + Sync + 'static {
    fn create(&self, card: Card);

    /// Merge into the current card under one lock. Returns `false` when the
    /// card no longer exists.
    fn update<F>(&self, id: &CardId, f: F) -> bool
    where
        F: FnOnce(&mut Card);

    fn get(&self, id: &CardId) -> Option<Card>;

    /// Cards in creation order.
    fn list(&self) -> Vec<Card>;

    fn remove(&self, id: &CardId) -> bool;

    /// Visible page-space rectangle, if the engine knows its screen size.
    fn viewport(&self) -> Option<Bounds>;

    /// Viewport size in screen pixels.
    fn screen_size(&self) -> Option<(f32, f32)>;

    fn camera(&self) -> Camera;

    fn set_camera(&self, camera: Camera, animate_ms: u64);

    /// Run several mutations as one atomic operation.
    fn batch<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BoardState) -> R;

    fn contains(&self, id: &CardId) -> bool {
        self.get(id).is_some()
    }

    /// Number of committed updates to the card, `None` when it is gone.
    fn revision(&self, id: &CardId) -> Option<u64>;
}

/// Mutable board contents handed to [`CardStore::batch`].
#[derive(Debug, Default)]
pub struct BoardState {
    cards: Vec<Card>,
    /// Parallel to `cards`
    revisions: Vec<u64>,
    pending: Vec<StoreEvent>,
}

impl BoardState {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    fn position(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.position(id).map(|i| &self.cards[i])
    }

    pub fn revision(&self, id: &CardId) -> Option<u64> {
        self.position(id).map(|i| self.revisions[i])
    }

    pub fn insert(&mut self, card: Card) {
        match self.position(&card.id) {
            Some(i) => {
                let id = card.id.clone();
                self.cards[i] = card;
                self.bump(i, id);
            }
            None => {
                self.cards.push(card.clone());
                self.revisions.push(0);
                self.pending.push(StoreEvent::Created(card));
            }
        }
    }

    /// Apply `f` to the card. Every successful update is one revision and
    /// one event.
    pub fn update<F>(&mut self, id: &CardId, f: F) -> bool
    where
        F: FnOnce(&mut Card),
    {
        let Some(i) = self.position(id) else {
            return false;
        };
        let card = &mut self.cards[i];
        let kind = card.kind();
        f(card);
        // Id is immutable
        card.id = id.clone();
        if card.kind() != kind {
            warn!(card = %id, from = kind.label(), to = card.kind().label(), "update changed card kind");
        }
        self.bump(i, id.clone());
        true
    }

    fn bump(&mut self, index: usize, id: CardId) {
        self.revisions[index] += 1;
        self.pending.push(StoreEvent::Updated {
            id,
            revision: self.revisions[index],
        });
    }

    pub fn remove(&mut self, id: &CardId) -> bool {
        let Some(i) = self.position(id) else {
            return false;
        };
        self.cards.remove(i);
        self.revisions.remove(i);
        self.pending.push(StoreEvent::Removed(id.clone()));
        true
    }
}

struct Inner {
    board: BoardState,
    camera: Camera,
    screen_size: Option<(f32, f32)>,
}

/// In-memory card store with change notifications.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner {
                board: BoardState::default(),
                camera: Camera::default(),
                screen_size: None,
            }),
            events,
        }
    }

    /// Store whose viewport is `width` x `height` screen pixels.
    pub fn with_screen(width: f32, height: f32) -> Self {
        let store = Self::new();
        store.set_screen_size(Some((width, height)));
        store
    }

    pub fn set_screen_size(&self, size: Option<(f32, f32)>) {
        self.inner.write().screen_size = size;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.read().board.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, events: Vec<StoreEvent>) {
        for event in events {
            trace!(?event, "store event");
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CardStore for MemoryStore {
    fn create(&self, card: Card) {
        self.batch(|board| board.insert(card));
    }

    fn update<F>(&self, id: &CardId, f: F) -> bool
    where
        F: FnOnce(&mut Card),
    {
        self.batch(|board| board.update(id, f))
    }

    fn get(&self, id: &CardId) -> Option<Card> {
        self.inner.read().board.get(id).cloned()
    }

    fn list(&self) -> Vec<Card> {
        self.inner.read().board.cards.clone()
    }

    fn remove(&self, id: &CardId) -> bool {
        self.batch(|board| board.remove(id))
    }

    fn viewport(&self) -> Option<Bounds> {
        let inner = self.inner.read();
        let (width, height) = inner.screen_size?;
        let camera = inner.camera;
        if camera.zoom <= 0.0 {
            return None;
        }
        Some(Bounds::new(
            -camera.x,
            -camera.y,
            width / camera.zoom,
            height / camera.zoom,
        ))
    }

    fn screen_size(&self) -> Option<(f32, f32)> {
        self.inner.read().screen_size
    }

    fn contains(&self, id: &CardId) -> bool {
        self.inner.read().board.position(id).is_some()
    }

    fn revision(&self, id: &CardId) -> Option<u64> {
        self.inner.read().board.revision(id)
    }

    fn camera(&self) -> Camera {
        self.inner.read().camera
    }

    fn set_camera(&self, camera: Camera, animate_ms: u64) {
        self.inner.write().camera = camera;
        self.publish(vec![StoreEvent::CameraMoved { camera, animate_ms }]);
    }

    fn batch<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BoardState) -> R,
    {
        let (result, events) = {
            let mut inner = self.inner.write();
            let result = f(&mut inner.board);
            (result, std::mem::take(&mut inner.board.pending))
        };
        self.publish(events);
        result
    }
}
