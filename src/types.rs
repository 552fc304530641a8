//! Core types for the card system.
//!
//! A [`Card`] is a canvas-resident element whose props are a tagged union of
//! per-kind records ([`CardContent`]). Tabular data reuses the typed cell
//! model ([`DataCell`], [`DataRow`], [`TableData`]).

use crate::constants::{
    IMAGE_DEFAULT_SIZE, LINK_DEFAULT_SIZE, PDF_DEFAULT_SIZE, TABLE_DEFAULT_SIZE,
    VIDEO_DEFAULT_SIZE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Identity
// ============================================================================

/// Opaque card identifier, namespaced by kind (`excel_…`, `pdf_…`, …).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(String);

impl CardId {
    /// Generate a fresh id for a card of the given kind.
    pub fn generate(kind: CardKind) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}_{}", kind.id_prefix(), millis, &suffix[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The immutable kind of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardKind {
    SpreadsheetTable,
    PdfDocument,
    Image,
    LinkPreview,
    VideoEmbed,
}

impl CardKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            CardKind::SpreadsheetTable => "excel",
            CardKind::PdfDocument => "pdf",
            CardKind::Image => "image",
            CardKind::LinkPreview => "link",
            CardKind::VideoEmbed => "video",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardKind::SpreadsheetTable => "spreadsheet-table",
            CardKind::PdfDocument => "pdf-document",
            CardKind::Image => "image",
            CardKind::LinkPreview => "link-preview",
            CardKind::VideoEmbed => "video-embed",
        }
    }

    /// Size a card of this kind is created with.
    pub fn default_size(self) -> (f32, f32) {
        match self {
            CardKind::SpreadsheetTable => TABLE_DEFAULT_SIZE,
            CardKind::PdfDocument => PDF_DEFAULT_SIZE,
            CardKind::Image => IMAGE_DEFAULT_SIZE,
            CardKind::LinkPreview => LINK_DEFAULT_SIZE,
            CardKind::VideoEmbed => VIDEO_DEFAULT_SIZE,
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Axis-aligned box in canvas-page coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the X ranges of both boxes share more than an edge.
    pub fn overlaps_x(&self, other: &Bounds) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// Camera state: `screen = (page + (x, y)) * zoom`.
///
/// The visible page-space origin is therefore `(-x, -y)`; moving content
/// right on screen means increasing `x`, which moves that origin left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: crate::constants::DEFAULT_ZOOM,
        }
    }
}

// ============================================================================
// Tabular data
// ============================================================================

/// A single cell value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataCell {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(String), // ISO 8601 format
    Empty,
}

impl fmt::Display for DataCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCell::Text(s) | DataCell::Date(s) => f.write_str(s),
            DataCell::Number(n) => {
                // No trailing zeros for whole numbers
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            DataCell::Boolean(b) => write!(f, "{b}"),
            DataCell::Empty => Ok(()),
        }
    }
}

impl DataCell {
    /// Parse a string into a DataCell, trying to preserve type
    pub fn parse(value: &str, hint: DataType) -> Self {
        if value.is_empty() {
            return DataCell::Empty;
        }

        match hint {
            DataType::Number => value
                .parse::<f64>()
                .map(DataCell::Number)
                .unwrap_or_else(|_| DataCell::Text(value.to_string())),
            DataType::Boolean => match value.to_lowercase().as_str() {
                "true" | "yes" => DataCell::Boolean(true),
                "false" | "no" => DataCell::Boolean(false),
                _ => DataCell::Text(value.to_string()),
            },
            DataType::Date => DataCell::Date(value.to_string()),
            DataType::Text => DataCell::Text(value.to_string()),
        }
    }

    /// Convert a JSON value returned by an external service.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => DataCell::Empty,
            Value::Bool(b) => DataCell::Boolean(*b),
            Value::Number(n) => n.as_f64().map(DataCell::Number).unwrap_or(DataCell::Empty),
            Value::String(s) if s.is_empty() => DataCell::Empty,
            Value::String(s) => DataCell::Text(s.clone()),
            other => DataCell::Text(other.to_string()),
        }
    }
}

/// Supported data types for cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
}

/// A row of data cells, aligned with [`TableData::columns`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub cells: Vec<DataCell>,
}

impl DataRow {
    pub fn new(cells: Vec<DataCell>) -> Self {
        Self { cells }
    }
}

/// Column headers plus the rows beneath them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
}

impl TableData {
    pub fn new(columns: Vec<String>, rows: Vec<DataRow>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build a table from a list of JSON objects.
    ///
    /// Columns are the union of keys in order of first appearance; rows
    /// missing a key get [`DataCell::Empty`]. Non-object entries yield `None`.
    pub fn from_records(records: &[Value]) -> Option<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            let object = record.as_object()?;
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                DataRow::new(
                    columns
                        .iter()
                        .map(|c| object.get(c).map(DataCell::from_json).unwrap_or(DataCell::Empty))
                        .collect(),
                )
            })
            .collect();

        Some(Self { columns, rows })
    }
}

/// One named sheet of a workbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub data: TableData,
}

/// A parsed workbook: sheets in workbook order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Tab-separated text of each sheet (header plus at most `max_rows` rows),
    /// the raw form handed to the enhancement service.
    pub fn to_raw_text(&self, max_rows: usize) -> String {
        let mut out = String::new();
        for (index, sheet) in self.sheets.iter().enumerate() {
            if index > 0 {
                out.push_str("\n\n");
            }
            out.push_str("SHEET: ");
            out.push_str(&sheet.name);
            out.push('\n');
            out.push_str(&sheet.data.columns.join("\t"));
            for row in sheet.data.rows.iter().take(max_rows) {
                out.push('\n');
                let cells: Vec<String> = row.cells.iter().map(ToString::to_string).collect();
                out.push_str(&cells.join("\t"));
            }
        }
        out
    }
}

// ============================================================================
// Card content
// ============================================================================

/// Progress of the background enhancement stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnhancementStatus {
    #[default]
    None,
    Running,
    Done,
    /// Silent failure: standard-parsed data stays in place.
    Failed,
}

/// Where a table card's data came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TableSource {
    #[default]
    File,
    SheetsUrl { url: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    pub file_name: String,
    pub display_title: String,
    pub source: TableSource,
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
    /// Full data of every sheet, so a sheet switch can replace `rows`.
    /// Shared so copying the card never copies the workbook.
    pub sheets: Arc<[Sheet]>,
    pub sheet_names: Vec<String>,
    pub active_sheet: Option<String>,
    pub current_page_index: usize,
    pub is_loading: bool,
    pub is_streaming: bool,
    /// Row count the current stream is heading towards.
    pub total_rows: usize,
    /// Bumped whenever `rows` is replaced wholesale; stale streams stop.
    pub stream_generation: u64,
    pub enhancement_status: EnhancementStatus,
    pub enhancement_progress: u8,
    pub enhancement_message: String,
    /// Soft-failure explanation shown in place of rows (e.g. unreachable sheet)
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl TableContent {
    pub fn total_pages(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.rows.len().div_ceil(page_size)
    }

    /// Rows on the current page.
    pub fn visible_row_count(&self, page_size: usize) -> usize {
        let start = self.current_page_index.saturating_mul(page_size);
        self.rows.len().saturating_sub(start).min(page_size)
    }

    pub fn has_multiple_sheets(&self) -> bool {
        self.sheet_names.len() > 1
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfContent {
    pub file_name: String,
    pub byte_size: u64,
    /// `data:application/pdf;base64,…` once the background read finishes.
    pub encoded_bytes: Option<String>,
    pub current_page_index: usize,
    pub page_count: Option<usize>,
    pub page_native_height: Option<f32>,
    pub is_loading: bool,
    pub is_initial_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub file_name: String,
    pub byte_size: u64,
    /// `data:<mime>;base64,…` once decoded.
    pub encoded_bytes: Option<String>,
    pub display_size: Option<(f32, f32)>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub favicon_url: Option<String>,
    pub screenshot_url: Option<String>,
    pub fallback_screenshot_url: Option<String>,
    pub use_fallback_screenshot: bool,
    pub screenshot_failed: bool,
    pub summary: Option<String>,
    /// Which attempt produced the page, or `fallback`.
    pub fetched_via: Option<String>,
    pub is_loading: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoContent {
    pub url: String,
    pub video_id: String,
}

/// The content of a card, discriminated by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CardContent {
    SpreadsheetTable(TableContent),
    PdfDocument(PdfContent),
    Image(ImageContent),
    LinkPreview(LinkContent),
    VideoEmbed(VideoContent),
}

impl CardContent {
    pub fn kind(&self) -> CardKind {
        match self {
            CardContent::SpreadsheetTable(_) => CardKind::SpreadsheetTable,
            CardContent::PdfDocument(_) => CardKind::PdfDocument,
            CardContent::Image(_) => CardKind::Image,
            CardContent::LinkPreview(_) => CardKind::LinkPreview,
            CardContent::VideoEmbed(_) => CardKind::VideoEmbed,
        }
    }

    pub fn as_table(&self) -> Option<&TableContent> {
        match self {
            CardContent::SpreadsheetTable(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableContent> {
        match self {
            CardContent::SpreadsheetTable(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_pdf(&self) -> Option<&PdfContent> {
        match self {
            CardContent::PdfDocument(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pdf_mut(&mut self) -> Option<&mut PdfContent> {
        match self {
            CardContent::PdfDocument(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageContent> {
        match self {
            CardContent::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageContent> {
        match self {
            CardContent::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&LinkContent> {
        match self {
            CardContent::LinkPreview(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_link_mut(&mut self) -> Option<&mut LinkContent> {
        match self {
            CardContent::LinkPreview(l) => Some(l),
            _ => None,
        }
    }
}

/// Derived lifecycle of a card, used for assertions and chrome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStage {
    Placeholder,
    PartiallyLoaded,
    Loaded,
    Errored,
}

/// An interactive card placed on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Top-left in canvas-page coordinates (x, y)
    pub position: (f32, f32),
    /// Size in canvas units (width, height)
    pub size: (f32, f32),
    pub content: CardContent,
}

impl Card {
    pub fn new(id: CardId, position: (f32, f32), size: (f32, f32), content: CardContent) -> Self {
        Self {
            id,
            position,
            size,
            content,
        }
    }

    pub fn kind(&self) -> CardKind {
        self.content.kind()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.position.0, self.position.1, self.size.0, self.size.1)
    }

    pub fn lifecycle_stage(&self) -> LifecycleStage {
        match &self.content {
            CardContent::SpreadsheetTable(t) => {
                if t.error.is_some() {
                    LifecycleStage::Errored
                } else if t.is_loading && t.rows.is_empty() {
                    LifecycleStage::Placeholder
                } else if t.is_streaming || t.enhancement_status == EnhancementStatus::Running {
                    LifecycleStage::PartiallyLoaded
                } else {
                    LifecycleStage::Loaded
                }
            }
            CardContent::PdfDocument(p) => {
                if p.error.is_some() {
                    LifecycleStage::Errored
                } else if p.is_initial_loading {
                    LifecycleStage::Placeholder
                } else {
                    LifecycleStage::Loaded
                }
            }
            CardContent::Image(i) => {
                if i.error.is_some() {
                    LifecycleStage::Errored
                } else if i.is_loading {
                    LifecycleStage::Placeholder
                } else {
                    LifecycleStage::Loaded
                }
            }
            CardContent::LinkPreview(l) => {
                if l.is_loading {
                    LifecycleStage::Placeholder
                } else {
                    LifecycleStage::Loaded
                }
            }
            CardContent::VideoEmbed(_) => LifecycleStage::Loaded,
        }
    }
}

/// Human-readable file size for card headers.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
