//! Ingestion pipelines.
//!
//! Every `ingest_*` call creates its placeholder card synchronously (placed by
//! the Position Allocator, camera reconciled), then hands the slow stages to a
//! Tokio task and returns an [`IngestHandle`]. Stages write through
//! [`CardStore::update`] only; a `false` return means the card was deleted and
//! the stage stops quietly.
//!
//! Must be called from within a Tokio runtime.

mod image;
mod link;
mod pdf;
mod sheets_url;
mod spreadsheet;
mod video;

pub use image::fit_display_size;
pub use pdf::is_pdf;

use crate::config::BoardConfig;
use crate::controller::settle_height;
use crate::layout::{self, CameraLimits};
use crate::services::{Enhancer, RelayChain, WorkbookParser};
use crate::store::CardStore;
use crate::types::{Bounds, Card, CardContent, CardId, DataRow};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};

/// Placeholder id plus the background work still running for it.
#[derive(Debug)]
pub struct IngestHandle {
    pub card_id: CardId,
    /// `None` when the card needed no background stage
    pub task: Option<JoinHandle<()>>,
}

impl IngestHandle {
    fn immediate(card_id: CardId) -> Self {
        Self { card_id, task: None }
    }

    /// Wait for every background stage to finish.
    pub async fn finished(self) -> CardId {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                debug!(card = %self.card_id, error = %e, "ingest task ended abnormally");
            }
        }
        self.card_id
    }
}

/// Shared handles every pipeline needs.
pub struct Pipelines<S: CardStore> {
    store: Arc<S>,
    config: Arc<BoardConfig>,
    parser: Arc<dyn WorkbookParser>,
    enhancer: Option<Arc<dyn Enhancer>>,
    relays: RelayChain,
}

impl<S: CardStore> Clone for Pipelines<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            parser: self.parser.clone(),
            enhancer: self.enhancer.clone(),
            relays: self.relays.clone(),
        }
    }
}

impl<S: CardStore> Pipelines<S> {
    pub fn new(
        store: Arc<S>,
        config: Arc<BoardConfig>,
        parser: Arc<dyn WorkbookParser>,
        enhancer: Option<Arc<dyn Enhancer>>,
        relays: RelayChain,
    ) -> Self {
        Self {
            store,
            config,
            parser,
            enhancer,
            relays,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &Arc<BoardConfig> {
        &self.config
    }

    /// Allocate a position, create the card and bring it into view.
    fn place(&self, content: CardContent) -> CardId {
        let kind = content.kind();
        let size = kind.default_size();
        let id = CardId::generate(kind);
        let viewport = self.store.viewport();
        let gap = self.config.placement_gap;

        let bounds = self.store.batch(|board| {
            let existing: Vec<Bounds> = board.cards().iter().map(Card::bounds).collect();
            let position = layout::find_position(&existing, viewport, size, gap);
            let mut card = Card::new(id.clone(), position, size, content);
            settle_height(&mut card, &self.config);
            let bounds = card.bounds();
            board.insert(card);
            bounds
        });

        info!(card = %id, kind = kind.label(), x = bounds.x, y = bounds.y, "placeholder created");
        layout::reconcile(self.store.as_ref(), bounds, &CameraLimits::from(self.config.as_ref()));
        id
    }

    /// Run `stages` in the background inside an `ingest` span.
    fn spawn<F>(&self, card_id: &CardId, stages: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = info_span!("ingest", card = %card_id);
        tokio::spawn(stages.instrument(span))
    }

    fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.config.stage_start_delay_ms)
    }
}

/// How a streaming loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StreamEnd {
    Complete,
    /// Rows were replaced wholesale (sheet switch, enhancement)
    Superseded,
    /// The card was deleted
    Cancelled,
}

/// Append `source` to the table card's rows batch by batch, yielding between
/// batches. Stops when the card's stream generation moves past `generation`.
pub(crate) async fn stream_rows<S: CardStore>(
    store: Arc<S>,
    card_id: CardId,
    generation: u64,
    source: Arc<Vec<DataRow>>,
    config: Arc<BoardConfig>,
) -> StreamEnd {
    let batch = config.batch_size.max(1);
    let mut batches = 0usize;

    loop {
        tokio::time::sleep(config.batch_yield()).await;

        let mut end = None;
        let exists = store.update(&card_id, |card| {
            let Some(table) = card.content.as_table_mut() else {
                end = Some(StreamEnd::Cancelled);
                return;
            };
            if table.stream_generation != generation {
                end = Some(StreamEnd::Superseded);
                return;
            }
            let start = table.rows.len().min(source.len());
            let stop = (start + batch).min(source.len());
            table.rows.extend_from_slice(&source[start..stop]);
            table.is_streaming = stop < source.len();
            if !table.is_streaming {
                end = Some(StreamEnd::Complete);
            }
        });
        batches += 1;

        if !exists {
            debug!(card = %card_id, batches, "card removed while streaming");
            return StreamEnd::Cancelled;
        }
        if let Some(end) = end {
            debug!(card = %card_id, batches, ?end, "stream ended");
            return end;
        }
    }
}
