//! Video embeds need no background stage: the card is complete on creation.

use super::{IngestHandle, Pipelines};
use crate::error::{IngestError, IngestResult};
use crate::store::CardStore;
use crate::types::{CardContent, VideoContent};
use crate::urls::extract_youtube_id;
use tracing::info;

impl<S: CardStore> Pipelines<S> {
    /// Ingest a pasted YouTube link.
    pub fn ingest_video(&self, url: &str) -> IngestResult<IngestHandle> {
        let video_id = extract_youtube_id(url).ok_or_else(|| IngestError::InvalidUrl(url.to_string()))?;
        info!(url, video_id = %video_id, "video embed created");

        let card_id = self.place(CardContent::VideoEmbed(VideoContent {
            url: url.to_string(),
            video_id,
        }));
        Ok(IngestHandle::immediate(card_id))
    }
}
