//! Spreadsheet pipeline: quick preview, batch streaming and AI enhancement.
//!
//! After the placeholder shows the first batch of sheet one, two stages run
//! concurrently. Streaming appends the remaining rows batch by batch.
//! Enhancement asks the [`Enhancer`] for a cleaned table while a ticker fakes
//! progress; the ticker is polled in the same `select!` as the real call, so
//! it is always stopped before the result is written.

use super::{IngestHandle, Pipelines, StreamEnd, stream_rows};
use crate::config::BoardConfig;
use crate::controller::settle_height;
use crate::error::ServiceError;
use crate::perf::{DEFAULT_STAGE_THRESHOLD_MS, ScopedTimer};
use crate::services::{DelimitedParser, EnhancedTable, Enhancer, WorkbookParser, generate_title_from_data};
use crate::store::CardStore;
use crate::types::{CardContent, CardId, EnhancementStatus, TableContent, TableSource, Workbook};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const ENHANCE_RUNNING_MESSAGE: &str = "Enhancing table";
const ENHANCE_DONE_MESSAGE: &str = "Enhanced";

/// `.csv` and `.tsv` files are parsed in-crate; everything else goes to the
/// configured workbook parser.
fn is_delimited(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.ends_with(".csv") || lower.ends_with(".tsv")
}

/// Initial table content for a parsed workbook: sheet one's first batch.
pub(crate) fn preview_content(
    file_name: &str,
    source: TableSource,
    workbook: &Workbook,
    batch_size: usize,
) -> TableContent {
    let sheet_names = workbook.sheet_names();
    let first = workbook.sheets.first();
    let total = first.map(|s| s.data.rows.len()).unwrap_or(0);
    let preview = first
        .map(|s| s.data.rows.iter().take(batch_size).cloned().collect())
        .unwrap_or_default();
    let multi_sheet = sheet_names.len() > 1;

    TableContent {
        file_name: file_name.to_string(),
        display_title: file_name.to_string(),
        source,
        columns: first.map(|s| s.data.columns.clone()).unwrap_or_default(),
        rows: preview,
        sheets: Arc::from(workbook.sheets.as_slice()),
        active_sheet: if multi_sheet { sheet_names.first().cloned() } else { None },
        sheet_names: if multi_sheet { sheet_names } else { Vec::new() },
        is_streaming: total > batch_size,
        total_rows: total,
        ..Default::default()
    }
}

impl<S: CardStore> Pipelines<S> {
    /// Ingest a dropped spreadsheet file.
    ///
    /// A parse failure still creates the card, in its error state.
    pub fn ingest_spreadsheet(&self, file_name: &str, bytes: &[u8]) -> IngestHandle {
        info!(file_name, bytes = bytes.len(), "spreadsheet ingest started");

        let parsed = {
            let _timer = ScopedTimer::new("parse_workbook", DEFAULT_STAGE_THRESHOLD_MS);
            if is_delimited(file_name) {
                DelimitedParser.parse(file_name, bytes)
            } else {
                self.parser.parse(file_name, bytes)
            }
        };
        let workbook = match parsed {
            Ok(workbook) if !workbook.is_empty() => workbook,
            Ok(_) => return self.errored_table(file_name, "Workbook has no sheets".to_string()),
            Err(e) => return self.errored_table(file_name, e.to_string()),
        };

        let mut content = preview_content(file_name, TableSource::File, &workbook, self.config.batch_size);
        match self.enhancer {
            Some(_) => {
                content.enhancement_status = EnhancementStatus::Running;
                content.enhancement_message = ENHANCE_RUNNING_MESSAGE.to_string();
            }
            None => content.enhancement_status = EnhancementStatus::Failed,
        }
        let first_sheet_rows = Arc::new(
            workbook
                .sheets
                .first()
                .map(|s| s.data.rows.clone())
                .unwrap_or_default(),
        );
        let needs_stream = content.is_streaming;
        let card_id = self.place(CardContent::SpreadsheetTable(content));

        let store = self.store.clone();
        let config = self.config.clone();
        let enhancer = self.enhancer.clone();
        let id = card_id.clone();
        let file_name = file_name.to_string();
        let delay = self.stage_delay();

        let task = self.spawn(&card_id, async move {
            tokio::time::sleep(delay).await;

            let streaming = async {
                if needs_stream {
                    stream_rows(store.clone(), id.clone(), 0, first_sheet_rows, config.clone()).await;
                }
            };
            let enhancing = async {
                if let Some(enhancer) = enhancer {
                    enhance(store.clone(), id.clone(), enhancer, &workbook, &file_name, config.clone()).await;
                }
            };
            tokio::join!(streaming, enhancing);
            info!(card = %id, "spreadsheet ingest finished");
        });

        IngestHandle {
            card_id,
            task: Some(task),
        }
    }

    fn errored_table(&self, file_name: &str, message: String) -> IngestHandle {
        error!(file_name, error = %message, "spreadsheet could not be parsed");
        let content = TableContent {
            file_name: file_name.to_string(),
            display_title: file_name.to_string(),
            error: Some(format!("Could not read {file_name}: {message}")),
            ..Default::default()
        };
        IngestHandle::immediate(self.place(CardContent::SpreadsheetTable(content)))
    }
}

/// Advance the synthetic progress bar. Returns `false` once the card is gone.
fn tick<S: CardStore>(store: &S, id: &CardId, config: &BoardConfig) -> bool {
    store.update(id, |card| {
        if let Some(table) = card.content.as_table_mut() {
            if table.enhancement_status == EnhancementStatus::Running {
                table.enhancement_progress = table
                    .enhancement_progress
                    .saturating_add(config.enhance_tick_step)
                    .min(config.enhance_tick_cap);
            }
        }
    })
}

/// Enhancement stage. Never surfaces an error: any failure leaves the
/// standard-parsed rows in place.
async fn enhance<S: CardStore>(
    store: Arc<S>,
    id: CardId,
    enhancer: Arc<dyn Enhancer>,
    workbook: &Workbook,
    file_name: &str,
    config: Arc<BoardConfig>,
) {
    let raw_text = workbook.to_raw_text(usize::MAX);
    let call = tokio::time::timeout(
        Duration::from_millis(config.enhance_timeout_ms),
        enhancer.enhance(&raw_text, file_name),
    );
    tokio::pin!(call);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.enhance_tick_ms.max(1)));
    // First tick completes immediately
    ticker.tick().await;

    let result = loop {
        tokio::select! {
            biased;
            result = &mut call => break result,
            _ = ticker.tick() => {
                if !tick(store.as_ref(), &id, &config) {
                    debug!(card = %id, "card removed during enhancement");
                    return;
                }
            }
        }
    };

    match result.unwrap_or_else(|_| Err(ServiceError::Timeout(config.enhance_timeout_ms))) {
        Ok(enhanced) => apply_enhancement(store, id, enhanced, workbook, file_name, config).await,
        Err(e) => {
            warn!(card = %id, error = %e, "enhancement failed, keeping parsed data");
            fail_enhancement(store.as_ref(), &id, &config);
        }
    }
}

fn fail_enhancement<S: CardStore>(store: &S, id: &CardId, config: &BoardConfig) {
    store.update(id, |card| {
        if let Some(table) = card.content.as_table_mut() {
            table.enhancement_status = EnhancementStatus::Failed;
            table.enhancement_progress = 0;
            table.enhancement_message.clear();
        }
        settle_height(card, config);
    });
}

/// Swap the enhanced table in and restream it when it exceeds one batch.
///
/// Multi-sheet workbooks keep their per-sheet rows so the sheet tabs stay
/// consistent; only the title is taken from the enhanced result.
async fn apply_enhancement<S: CardStore>(
    store: Arc<S>,
    id: CardId,
    enhanced: EnhancedTable,
    workbook: &Workbook,
    file_name: &str,
    config: Arc<BoardConfig>,
) {
    let EnhancedTable { data, display_title } = enhanced;
    let title = display_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| generate_title_from_data(&data.columns, file_name));
    let multi_sheet = workbook.sheets.len() > 1;
    let batch = config.batch_size.max(1);
    let total = data.rows.len();
    let rows = Arc::new(data.rows);

    let mut generation = None;
    let exists = store.update(&id, |card| {
        if let Some(table) = card.content.as_table_mut() {
            table.display_title = title.clone();
            table.enhancement_status = EnhancementStatus::Done;
            table.enhancement_progress = 100;
            table.enhancement_message = ENHANCE_DONE_MESSAGE.to_string();
            if !multi_sheet {
                table.stream_generation += 1;
                table.columns = data.columns.clone();
                table.rows = rows.iter().take(batch).cloned().collect();
                table.total_rows = total;
                table.is_streaming = total > batch;
                table.current_page_index = 0;
                generation = Some(table.stream_generation);
            }
        }
        settle_height(card, &config);
    });
    if !exists {
        return;
    }
    info!(card = %id, rows = total, title = %title, "enhancement applied");

    if let Some(generation) = generation.filter(|_| total > batch) {
        if stream_rows(store, id.clone(), generation, rows, config).await == StreamEnd::Superseded {
            debug!(card = %id, "enhanced stream superseded");
        }
    }
}
