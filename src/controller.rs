//! Card Controller: per-card reactions to user and renderer events.
//!
//! A controller is bound to one card and holds a handle to the store. Every
//! operation is a single read-merge-write through [`CardStore::update`], so
//! observers never see a half-applied change. Invalid requests are rejected
//! silently and reported through the `bool`/`Option` return values.

use crate::config::BoardConfig;
use crate::layout::{self, Measurements};
use crate::store::CardStore;
use crate::types::{Card, CardContent, CardId, EnhancementStatus};
use std::sync::Arc;
use tracing::{debug, error};

/// Height Policy inputs derived from a card's current content.
pub fn measure(card: &Card, page_size: usize) -> Measurements {
    match &card.content {
        CardContent::SpreadsheetTable(t) => Measurements::Table {
            visible_rows: t.visible_row_count(page_size),
            multi_sheet: t.has_multiple_sheets(),
            enhancing: t.enhancement_status == EnhancementStatus::Running,
        },
        CardContent::PdfDocument(p) => Measurements::Pdf {
            page_height: if p.is_initial_loading { None } else { p.page_native_height },
        },
        CardContent::Image(i) => Measurements::Image {
            image_height: if i.is_loading { None } else { i.display_size.map(|(_, h)| h) },
        },
        CardContent::LinkPreview(l) => Measurements::Link {
            has_preview: l.screenshot_url.is_some(),
            has_summary: l.summary.as_deref().is_some_and(|s| !s.is_empty()),
            is_loading: l.is_loading,
        },
        CardContent::VideoEmbed(_) => Measurements::Video,
    }
}

/// Write `measured` (clamped to the kind's bounds) as the card height when it
/// differs from the stored height by more than `threshold`.
pub(crate) fn apply_height(card: &mut Card, measured: f32, threshold: f32) -> bool {
    let computed = layout::clamp_height(card.kind(), measured);
    if layout::exceeds_damping(card.size.1, computed, threshold) {
        card.size.1 = computed;
        true
    } else {
        false
    }
}

/// Re-derive the card height from its content.
pub(crate) fn settle_height(card: &mut Card, config: &BoardConfig) -> bool {
    let computed = layout::compute_height(&measure(card, config.page_size));
    apply_height(card, computed, config.damping_for(card.kind()))
}

/// Event handlers for one card.
pub struct CardController<S: CardStore> {
    store: Arc<S>,
    config: Arc<BoardConfig>,
    card_id: CardId,
}

impl<S: CardStore> CardController<S> {
    pub fn new(store: Arc<S>, config: Arc<BoardConfig>, card_id: CardId) -> Self {
        Self {
            store,
            config,
            card_id,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn card(&self) -> Option<Card> {
        self.store.get(&self.card_id)
    }

    /// Move to page `requested` of a table or pdf card.
    ///
    /// Accepted only when `0 <= requested < total pages`; a pdf whose page
    /// count is not yet known rejects every request.
    pub fn on_page_change(&self, requested: i64) -> bool {
        let page_size = self.config.page_size;
        let mut applied = false;
        self.store.update(&self.card_id, |card| {
            let (current, total) = match &mut card.content {
                CardContent::SpreadsheetTable(t) => {
                    let total = t.total_pages(page_size);
                    (&mut t.current_page_index, total)
                }
                CardContent::PdfDocument(p) => {
                    let total = p.page_count.unwrap_or(0);
                    (&mut p.current_page_index, total)
                }
                _ => return,
            };
            match usize::try_from(requested) {
                Ok(index) if index < total => {
                    *current = index;
                    applied = true;
                }
                _ => debug!(card = %card.id, requested, total, "page change rejected"),
            }
        });
        applied
    }

    /// Switch a multi-sheet table to sheet `name`.
    ///
    /// Replaces the rows wholesale, resets the page and stops any stream in
    /// flight for the previous rows.
    pub fn on_sheet_change(&self, name: &str) -> bool {
        let mut applied = false;
        self.store.update(&self.card_id, |card| {
            let Some(table) = card.content.as_table_mut() else {
                return;
            };
            if !table.sheet_names.iter().any(|n| n == name) {
                debug!(card = %card.id, sheet = name, "unknown sheet");
                return;
            }
            let Some(sheet) = table.sheet(name).cloned() else {
                return;
            };
            table.columns = sheet.data.columns;
            table.total_rows = sheet.data.rows.len();
            table.rows = sheet.data.rows;
            table.active_sheet = Some(sheet.name);
            table.current_page_index = 0;
            table.is_streaming = false;
            table.stream_generation += 1;
            applied = true;
        });
        applied
    }

    /// Feed a measured card height through the damping rule.
    pub fn on_height_measured(&self, height: f32) -> bool {
        let mut changed = false;
        self.store.update(&self.card_id, |card| {
            let threshold = self.config.damping_for(card.kind());
            changed = apply_height(card, height, threshold);
        });
        changed
    }

    /// Recompute the height from the card's current content.
    pub fn refresh_height(&self) -> bool {
        let mut changed = false;
        self.store.update(&self.card_id, |card| {
            changed = settle_height(card, &self.config);
        });
        changed
    }

    /// Current Height Policy inputs for the card.
    pub fn measure(&self) -> Option<Measurements> {
        self.card().map(|c| measure(&c, self.config.page_size))
    }

    /// Apply a resize gesture. Returns the new size.
    pub fn on_resize(&self, scale: (f32, f32)) -> Option<(f32, f32)> {
        let mut new_size = None;
        self.store.update(&self.card_id, |card| {
            if let Some(size) = layout::resize(card.kind(), card.size, scale) {
                card.size = size;
                new_size = Some(size);
            }
        });
        new_size
    }

    /// The pdf renderer finished parsing and knows the page count.
    pub fn on_document_loaded(&self, page_count: usize) -> bool {
        self.store.update(&self.card_id, |card| {
            if let Some(pdf) = card.content.as_pdf_mut() {
                pdf.page_count = Some(page_count);
                pdf.current_page_index = pdf.current_page_index.min(page_count.saturating_sub(1));
                pdf.is_loading = false;
            }
        })
    }

    /// A pdf page rendered at `page_height` canvas units.
    pub fn on_page_rendered(&self, page_height: f32) -> bool {
        let mut changed = false;
        self.store.update(&self.card_id, |card| {
            if let Some(pdf) = card.content.as_pdf_mut() {
                pdf.page_native_height = Some(page_height);
                changed = settle_height(card, &self.config);
            }
        });
        changed
    }

    /// The pdf renderer could not read the document.
    pub fn on_document_error(&self, message: &str) -> bool {
        self.store.update(&self.card_id, |card| {
            if let Some(pdf) = card.content.as_pdf_mut() {
                error!(card = %card.id, file = %pdf.file_name, reason = message, "pdf failed to load");
                pdf.error = Some(format!("Could not load {}: {message}", pdf.file_name));
                pdf.is_loading = false;
                pdf.is_initial_loading = false;
            }
        })
    }

    /// The image could not be displayed.
    pub fn on_image_error(&self, message: &str) -> bool {
        self.store.update(&self.card_id, |card| {
            if let Some(image) = card.content.as_image_mut() {
                error!(card = %card.id, file = %image.file_name, reason = message, "image failed to load");
                image.error = Some(format!("Could not load {}: {message}", image.file_name));
                image.is_loading = false;
            }
        })
    }

    /// The link screenshot failed to load: try the backup service once, then
    /// give up and show the placeholder.
    pub fn on_screenshot_failed(&self) -> bool {
        self.store.update(&self.card_id, |card| {
            if let Some(link) = card.content.as_link_mut() {
                if !link.use_fallback_screenshot && link.fallback_screenshot_url.is_some() {
                    link.use_fallback_screenshot = true;
                } else {
                    link.screenshot_failed = true;
                }
            }
        })
    }
}
