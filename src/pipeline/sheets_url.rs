//! Cloud spreadsheet links: fetch the CSV export through the relay chain and
//! stream it into an empty table card.

use super::spreadsheet::preview_content;
use super::{IngestHandle, Pipelines, stream_rows};
use crate::controller::settle_height;
use crate::error::{IngestError, IngestResult};
use crate::services::{DelimitedParser, WorkbookParser};
use crate::store::CardStore;
use crate::types::{Card, CardContent, TableContent, TableSource};
use crate::urls::sheets_csv_url;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SHEET_TITLE: &str = "Google Sheet";
const SHEET_CSV_NAME: &str = "sheet.csv";
const UNREACHABLE_NOTICE: &str =
    "Could not reach the spreadsheet. Check that it is shared publicly and try again.";

impl<S: CardStore> Pipelines<S> {
    /// Ingest a pasted spreadsheet share link.
    pub fn ingest_sheets_url(&self, url: &str) -> IngestResult<IngestHandle> {
        let csv_url = sheets_csv_url(url).ok_or_else(|| IngestError::InvalidUrl(url.to_string()))?;
        info!(url, csv_url = %csv_url, "spreadsheet link ingest started");

        let source = TableSource::SheetsUrl { url: url.to_string() };
        let content = TableContent {
            file_name: SHEET_TITLE.to_string(),
            display_title: SHEET_TITLE.to_string(),
            source: source.clone(),
            is_loading: true,
            ..Default::default()
        };
        let card_id = self.place(CardContent::SpreadsheetTable(content));

        let store = self.store.clone();
        let config = self.config.clone();
        let relays = self.relays.clone();
        let id = card_id.clone();
        let delay = self.stage_delay();

        let task = self.spawn(&card_id, async move {
            tokio::time::sleep(delay).await;

            let fetched = match relays.fetch(&csv_url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(card = %id, error = %e, "spreadsheet link unreachable");
                    store.update(&id, |card| {
                        if let Some(table) = card.content.as_table_mut() {
                            table.notice = Some(UNREACHABLE_NOTICE.to_string());
                            table.is_loading = false;
                        }
                        settle_height(card, &config);
                    });
                    return;
                }
            };
            debug!(card = %id, via = %fetched.via, bytes = fetched.body.len(), "csv export fetched");

            let workbook = match DelimitedParser.parse(SHEET_CSV_NAME, fetched.body.as_bytes()) {
                Ok(workbook) if !workbook.is_empty() => workbook,
                Ok(_) => {
                    store.update(&id, |card| fail_table(card, IngestError::EmptyWorkbook.to_string()));
                    return;
                }
                Err(e) => {
                    error!(card = %id, error = %e, "csv export could not be parsed");
                    store.update(&id, |card| fail_table(card, e.to_string()));
                    return;
                }
            };

            let preview = preview_content(SHEET_TITLE, source, &workbook, config.batch_size);
            let needs_stream = preview.is_streaming;
            let mut generation = 0;
            let exists = store.update(&id, |card| {
                if let Some(table) = card.content.as_table_mut() {
                    generation = table.stream_generation;
                    *table = TableContent {
                        stream_generation: generation,
                        ..preview
                    };
                }
                settle_height(card, &config);
            });
            if !exists {
                debug!(card = %id, "card removed before csv arrived");
                return;
            }

            if needs_stream {
                let rows = Arc::new(
                    workbook
                        .sheets
                        .into_iter()
                        .next()
                        .map(|s| s.data.rows)
                        .unwrap_or_default(),
                );
                stream_rows(store, id.clone(), generation, rows, config).await;
            }
            info!(card = %id, "spreadsheet link ingest finished");
        });

        Ok(IngestHandle {
            card_id,
            task: Some(task),
        })
    }
}

fn fail_table(card: &mut Card, message: String) {
    if let Some(table) = card.content.as_table_mut() {
        table.error = Some(format!("Could not read {SHEET_TITLE}: {message}"));
        table.is_loading = false;
    }
}
