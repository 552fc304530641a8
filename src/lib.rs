//! Card lifecycle and layout feedback for a canvas whiteboard.
//!
//! Pasted or dropped content (spreadsheets, PDFs, images, web links, video
//! links) becomes an interactive card on an infinite canvas. Each card is
//! created as a placeholder and filled in by a background pipeline, while the
//! layout policies keep its height, position and the camera consistent.
//!
//! The canvas engine is abstracted as a [`store::CardStore`];
//! [`store::MemoryStore`] is the in-process implementation.

pub mod board;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod logging;
pub mod perf;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod store;
pub mod types;
pub mod urls;

pub use board::Board;
pub use config::BoardConfig;
pub use controller::CardController;
pub use dispatch::{DroppedFile, Intercept, Payload};
pub use error::{ConfigError, IngestError, ServiceError};
pub use pipeline::{IngestHandle, Pipelines};
pub use store::{CardStore, MemoryStore, StoreEvent};
pub use types::{Card, CardContent, CardId, CardKind};
