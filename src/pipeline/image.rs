//! Image pipeline: decode for native dimensions, fit a display box, swap in
//! the data URL. Decode failures become the card's error state.

use super::{IngestHandle, Pipelines};
use crate::constants::{CARD_HEADER_HEIGHT, CARD_PADDING, IMAGE_DEFAULT_SIZE, MAX_IMAGE_DISPLAY, MIN_IMAGE_DISPLAY};
use crate::controller::settle_height;
use crate::error::{IngestError, IngestResult};
use crate::layout::width_bounds;
use crate::perf::{DEFAULT_STAGE_THRESHOLD_MS, ScopedTimer};
use crate::store::CardStore;
use crate::types::{CardContent, CardKind, ImageContent};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, error, info};

/// Scale `native` down into the maximum display box, keeping aspect ratio,
/// then raise each axis to the minimum display box.
pub fn fit_display_size(native: (u32, u32)) -> (f32, f32) {
    let (mut width, mut height) = (native.0 as f32, native.1 as f32);
    let (max_w, max_h) = MAX_IMAGE_DISPLAY;

    if width > max_w || height > max_h {
        let scale = (max_w / width).min(max_h / height);
        width = (width * scale).round();
        height = (height * scale).round();
    }

    (width.max(MIN_IMAGE_DISPLAY.0), height.max(MIN_IMAGE_DISPLAY.1))
}

fn is_svg(file_name: &str, bytes: &[u8]) -> bool {
    if file_name.to_lowercase().ends_with(".svg") {
        return true;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    head.trim_start().starts_with("<svg") || (head.contains("<?xml") && head.contains("<svg"))
}

/// Decoded image ready for the card
struct Decoded {
    data_url: String,
    display: (f32, f32),
}

fn decode(file_name: &str, bytes: &[u8]) -> IngestResult<Decoded> {
    let _timer = ScopedTimer::new("decode_image", DEFAULT_STAGE_THRESHOLD_MS);

    // Vector images have no native pixel size; show them in the default box
    if is_svg(file_name, bytes) {
        return Ok(Decoded {
            data_url: format!("data:image/svg+xml;base64,{}", STANDARD.encode(bytes)),
            display: IMAGE_DEFAULT_SIZE,
        });
    }

    let format = image::guess_format(bytes).map_err(|e| IngestError::Decode {
        file_name: file_name.to_string(),
        reason: e.to_string(),
    })?;
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| IngestError::Decode {
        file_name: file_name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Decoded {
        data_url: format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(bytes)),
        display: fit_display_size((decoded.width(), decoded.height())),
    })
}

impl<S: CardStore> Pipelines<S> {
    /// Ingest a dropped image file.
    pub fn ingest_image(&self, file_name: &str, bytes: Vec<u8>) -> IngestHandle {
        info!(file_name, bytes = bytes.len(), "image ingest started");

        let content = ImageContent {
            file_name: file_name.to_string(),
            byte_size: bytes.len() as u64,
            is_loading: true,
            ..Default::default()
        };
        let card_id = self.place(CardContent::Image(content));

        let store = self.store.clone();
        let config = self.config.clone();
        let id = card_id.clone();
        let file_name = file_name.to_string();
        let delay = self.stage_delay();

        let task = self.spawn(&card_id, async move {
            tokio::time::sleep(delay).await;

            // CPU-bound: runs on the blocking pool
            let name = file_name.clone();
            let decoded = tokio::task::spawn_blocking(move || decode(&name, &bytes))
                .await
                .unwrap_or_else(|e| {
                    Err(IngestError::Decode {
                        file_name: file_name.clone(),
                        reason: e.to_string(),
                    })
                });
            let exists = store.update(&id, |card| {
                let Some(image) = card.content.as_image_mut() else {
                    return;
                };
                image.is_loading = false;
                match decoded {
                    Ok(decoded) => {
                        image.encoded_bytes = Some(decoded.data_url);
                        image.display_size = Some(decoded.display);
                        let (min_w, max_w) = width_bounds(CardKind::Image);
                        card.size.0 = decoded.display.0.clamp(min_w, max_w);
                        debug!(
                            card = %card.id,
                            width = decoded.display.0,
                            height = decoded.display.1 + CARD_HEADER_HEIGHT + CARD_PADDING,
                            "image decoded"
                        );
                    }
                    Err(e) => {
                        error!(card = %card.id, error = %e, "image decode failed");
                        image.error = Some(e.to_string());
                    }
                }
                settle_height(card, &config);
            });
            if exists {
                info!(card = %id, "image ingest finished");
            }
        });

        IngestHandle {
            card_id,
            task: Some(task),
        }
    }
}
