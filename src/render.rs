//! Per-card render isolation.
//!
//! A panic while rendering one card must not take the rest of the board with
//! it. The rendering layer wraps each card's render closure in
//! [`render_guarded`] and draws an error frame for [`RenderOutcome::Failed`].

use crate::types::CardId;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

#[derive(Debug, PartialEq)]
pub enum RenderOutcome<T> {
    Rendered(T),
    Failed,
}

impl<T> RenderOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, RenderOutcome::Failed)
    }

    pub fn rendered(self) -> Option<T> {
        match self {
            RenderOutcome::Rendered(value) => Some(value),
            RenderOutcome::Failed => None,
        }
    }
}

/// Run `render` for `card_id`, turning a panic into [`RenderOutcome::Failed`].
pub fn render_guarded<T, F>(card_id: &CardId, render: F) -> RenderOutcome<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(render)) {
        Ok(value) => RenderOutcome::Rendered(value),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(card = %card_id, reason, "card render panicked");
            RenderOutcome::Failed
        }
    }
}
