//! Link pipeline: placeholder with the host name, then page metadata fetched
//! through the relay chain. Total relay exhaustion falls back to host-derived
//! defaults.

use super::{IngestHandle, Pipelines};
use crate::controller::settle_height;
use crate::services::metadata::{
    self, LinkMetadata, extract_text, fallback_metadata, generate_summary, parse_metadata,
};
use crate::store::CardStore;
use crate::types::{CardContent, LinkContent};
use crate::urls::host_label;
use tracing::{debug, info, warn};

/// `fetched_via` value when no attempt produced the page
pub const FALLBACK_VIA: &str = "fallback";

impl<S: CardStore> Pipelines<S> {
    /// Ingest a pasted web link.
    pub fn ingest_link(&self, url: &str) -> IngestHandle {
        info!(url, "link ingest started");

        let content = LinkContent {
            url: url.to_string(),
            title: host_label(url),
            is_loading: true,
            ..Default::default()
        };
        let card_id = self.place(CardContent::LinkPreview(content));

        let store = self.store.clone();
        let config = self.config.clone();
        let relays = self.relays.clone();
        let id = card_id.clone();
        let url = url.to_string();
        let delay = self.stage_delay();

        let task = self.spawn(&card_id, async move {
            tokio::time::sleep(delay).await;

            let (meta, page_text, via): (LinkMetadata, String, String) = match relays.fetch(&url).await {
                Ok(fetched) => {
                    debug!(card = %id, via = %fetched.via, bytes = fetched.body.len(), "page fetched");
                    (
                        parse_metadata(&fetched.body, &url),
                        extract_text(&fetched.body),
                        fetched.via,
                    )
                }
                Err(e) => {
                    warn!(card = %id, error = %e, "page unreachable, using fallback metadata");
                    (fallback_metadata(&url), String::new(), FALLBACK_VIA.to_string())
                }
            };
            let summary = generate_summary(&url, &meta.title, &meta.description, &page_text);

            let exists = store.update(&id, |card| {
                if let Some(link) = card.content.as_link_mut() {
                    link.title = meta.title;
                    link.description = meta.description;
                    link.favicon_url = meta.favicon_url;
                    link.summary = Some(summary);
                    link.screenshot_url = Some(metadata::screenshot_url(&url));
                    link.fallback_screenshot_url = Some(metadata::fallback_screenshot_url(&url));
                    link.fetched_via = Some(via);
                    link.is_loading = false;
                }
                settle_height(card, &config);
            });
            if exists {
                info!(card = %id, "link ingest finished");
            } else {
                debug!(card = %id, "card removed before metadata arrived");
            }
        });

        IngestHandle {
            card_id,
            task: Some(task),
        }
    }
}
