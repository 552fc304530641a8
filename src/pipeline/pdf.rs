//! PDF pipeline: placeholder, then the document bytes as a data URL.

use super::{IngestHandle, Pipelines};
use crate::controller::settle_height;
use crate::perf::{DEFAULT_STAGE_THRESHOLD_MS, ScopedTimer};
use crate::store::CardStore;
use crate::types::{CardContent, PdfContent, format_file_size};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, error, info};

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Bytes look like a PDF document (magic within the first KiB).
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes
        .windows(PDF_MAGIC.len())
        .take(1024)
        .any(|w| w == PDF_MAGIC)
}

impl<S: CardStore> Pipelines<S> {
    /// Ingest a dropped PDF file.
    ///
    /// Page count and page height arrive later from the renderer through the
    /// card controller.
    pub fn ingest_pdf(&self, file_name: &str, bytes: Vec<u8>) -> IngestHandle {
        info!(file_name, size = %format_file_size(bytes.len() as u64), "pdf ingest started");

        let content = PdfContent {
            file_name: file_name.to_string(),
            byte_size: bytes.len() as u64,
            is_loading: true,
            is_initial_loading: true,
            ..Default::default()
        };
        let card_id = self.place(CardContent::PdfDocument(content));

        let store = self.store.clone();
        let config = self.config.clone();
        let id = card_id.clone();
        let file_name = file_name.to_string();
        let delay = self.stage_delay();

        let task = self.spawn(&card_id, async move {
            tokio::time::sleep(delay).await;

            if !is_pdf(&bytes) {
                error!(card = %id, file_name, "not a pdf document");
                store.update(&id, |card| {
                    if let Some(pdf) = card.content.as_pdf_mut() {
                        pdf.error = Some(format!("Could not read {file_name}: not a PDF document"));
                        pdf.is_loading = false;
                        pdf.is_initial_loading = false;
                    }
                });
                return;
            }

            let data_url = {
                let _timer = ScopedTimer::new("encode_pdf", DEFAULT_STAGE_THRESHOLD_MS);
                format!("{PDF_DATA_URL_PREFIX}{}", STANDARD.encode(&bytes))
            };

            let exists = store.update(&id, |card| {
                if let Some(pdf) = card.content.as_pdf_mut() {
                    pdf.encoded_bytes = Some(data_url);
                    pdf.is_initial_loading = false;
                }
                settle_height(card, &config);
            });
            if exists {
                info!(card = %id, "pdf bytes ready");
            } else {
                debug!(card = %id, "card removed before pdf was ready");
            }
        });

        IngestHandle {
            card_id,
            task: Some(task),
        }
    }
}
