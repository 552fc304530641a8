//! Application-wide constants.
//!
//! Centralizes the layout values and timings the card pipelines depend on.
//! Everything tunable at runtime is mirrored in [`crate::config::BoardConfig`],
//! which uses these values as its defaults.

// ============================================================================
// Height Policy
// ============================================================================

/// Card header strip shared by every card kind
pub const CARD_HEADER_HEIGHT: f32 = 60.0;

/// Padding below card content
pub const CARD_PADDING: f32 = 40.0;

/// Sheet tab strip shown when a workbook has more than one sheet
pub const SHEET_CONTROLS_HEIGHT: f32 = 50.0;

/// Column header row of a table card
pub const TABLE_HEADER_HEIGHT: f32 = 40.0;

/// Height of one table row
pub const TABLE_ROW_HEIGHT: f32 = 60.0;

/// Enhancement progress bar
pub const PROGRESS_BAR_HEIGHT: f32 = 60.0;

/// Screenshot strip of a link card (400x225 preview)
pub const LINK_PREVIEW_HEIGHT: f32 = 225.0;

/// Summary paragraph of a link card
pub const LINK_SUMMARY_HEIGHT: f32 = 80.0;

/// Height bounds per kind: (min, max)
pub const TABLE_HEIGHT_BOUNDS: (f32, f32) = (200.0, 1500.0);
pub const PDF_HEIGHT_BOUNDS: (f32, f32) = (400.0, 1200.0);
pub const IMAGE_HEIGHT_BOUNDS: (f32, f32) = (200.0, 900.0);
pub const LINK_HEIGHT_BOUNDS: (f32, f32) = (180.0, 600.0);
pub const VIDEO_HEIGHT_BOUNDS: (f32, f32) = (158.0, 720.0);

/// Width bounds per kind used by resize: (min, max)
pub const TABLE_WIDTH_BOUNDS: (f32, f32) = (492.0, 3200.0);
pub const PDF_WIDTH_BOUNDS: (f32, f32) = (300.0, 1600.0);
pub const IMAGE_WIDTH_BOUNDS: (f32, f32) = (200.0, 1600.0);
pub const LINK_WIDTH_BOUNDS: (f32, f32) = (280.0, 800.0);
pub const VIDEO_WIDTH_BOUNDS: (f32, f32) = (280.0, 1280.0);

/// Width:height ratio kept by resize for table cards
pub const TABLE_ASPECT_RATIO: f32 = TABLE_DEFAULT_SIZE.0 / TABLE_DEFAULT_SIZE.1;

/// Width:height ratio kept by resize for pdf cards
pub const PDF_ASPECT_RATIO: f32 = PDF_DEFAULT_SIZE.0 / PDF_DEFAULT_SIZE.1;

/// Minimum stored-vs-measured delta before a height is rewritten
pub const DEFAULT_DAMPING_THRESHOLD: f32 = 10.0;

/// Link cards settle on a tighter threshold
pub const LINK_DAMPING_THRESHOLD: f32 = 5.0;

// ============================================================================
// Card Defaults
// ============================================================================

pub const TABLE_DEFAULT_SIZE: (f32, f32) = (1600.0, 650.0);
pub const PDF_DEFAULT_SIZE: (f32, f32) = (800.0, 600.0);
pub const IMAGE_DEFAULT_SIZE: (f32, f32) = (400.0, 300.0);
pub const LINK_DEFAULT_SIZE: (f32, f32) = (400.0, 180.0);
pub const VIDEO_DEFAULT_SIZE: (f32, f32) = (560.0, 315.0);

/// Display box an image is scaled down into
pub const MAX_IMAGE_DISPLAY: (f32, f32) = (800.0, 600.0);

/// Smallest display box an image is scaled up to
pub const MIN_IMAGE_DISPLAY: (f32, f32) = (200.0, 150.0);

// ============================================================================
// Placement & Camera
// ============================================================================

/// Horizontal gap between a new card and the rightmost existing card
pub const PLACEMENT_GAP: f32 = 80.0;

/// Recentre only when the target is off-centre by more than this fraction
/// of the viewport's smaller dimension
pub const RECENTER_FRACTION: f32 = 0.1;

/// Margin kept around a target box when zooming to fit
pub const CAMERA_PADDING: f32 = 40.0;

/// Minimum zoom level
pub const MIN_ZOOM: f32 = 0.05;

/// Maximum zoom level
pub const MAX_ZOOM: f32 = 8.0;

/// Default zoom level
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Camera transition duration in milliseconds
pub const CAMERA_ANIMATION_MS: u64 = 300;

// ============================================================================
// Streaming & Enhancement
// ============================================================================

/// Rows appended per streaming batch
pub const STREAM_BATCH_SIZE: usize = 50;

/// Pause between streaming batches so the renderer can paint
pub const STREAM_YIELD_MS: u64 = 16;

/// Rows per table page
pub const TABLE_PAGE_SIZE: usize = 10;

/// Delay before background stages start after the placeholder is created
pub const STAGE_START_DELAY_MS: u64 = 100;

/// Synthetic enhancement progress tick interval
pub const ENHANCE_TICK_MS: u64 = 400;

/// Progress added per tick
pub const ENHANCE_TICK_STEP: u8 = 10;

/// Ticks never push progress past this value
pub const ENHANCE_TICK_CAP: u8 = 90;

/// Upper bound on one enhancement call
pub const ENHANCE_TIMEOUT_MS: u64 = 60_000;

/// Rows per sheet sent to the enhancement service
pub const ENHANCE_SAMPLE_ROWS: usize = 20;

// ============================================================================
// Network
// ============================================================================

/// Per-attempt timeout for direct fetches and relays
pub const RELAY_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

/// Title length before truncation with "..."
pub const MAX_TITLE_CHARS: usize = 60;

/// Description length before truncation with "..."
pub const MAX_DESCRIPTION_CHARS: usize = 120;

/// Summary length before truncation with "..."
pub const MAX_SUMMARY_CHARS: usize = 180;

/// Text extracted from a page for summarising
pub const MAX_PAGE_TEXT_CHARS: usize = 1500;

// ============================================================================
// Data Loading
// ============================================================================

/// Maximum number of delimited-text rows to load
pub const MAX_CSV_ROWS: usize = 100_000;
