//! Paste/Drop Dispatcher.
//!
//! Classifies a clipboard or drop payload and routes it to one pipeline.
//! Priority: the first recognized file, then a spreadsheet share link, then a
//! YouTube link, then any other http(s) URL. Anything else is passed through
//! to the canvas engine's own paste handling.

use crate::error::{IngestError, IngestResult};
use crate::pipeline::{IngestHandle, Pipelines};
use crate::store::CardStore;
use crate::urls::{extract_youtube_id, is_sheets_url, parse_http_url};
use std::path::Path;
use tracing::{debug, info, warn};

/// One file carried by a drop or paste.
#[derive(Clone, Debug, Default)]
pub struct DroppedFile {
    pub name: String,
    /// Empty when the platform did not report one
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file dropped from the OS as a path. The MIME type is left for
    /// [`classify_file`] to infer.
    pub fn from_path(path: &Path) -> IngestResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(name, "", bytes))
    }
}

/// Everything a paste or drop event carries.
#[derive(Clone, Debug, Default)]
pub struct Payload {
    pub files: Vec<DroppedFile>,
    pub text: Option<String>,
}

impl Payload {
    pub fn files(files: Vec<DroppedFile>) -> Self {
        Self { files, text: None }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            text: Some(text.into()),
        }
    }
}

/// What a file is, as far as ingestion is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileClass {
    Spreadsheet,
    Pdf,
    Image,
    Unsupported,
}

const SPREADSHEET_MIMES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "text/csv",
    "text/tab-separated-values",
];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "csv", "tsv"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "ico", "tif", "tiff"];

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Classify a file by its leading bytes, then its MIME type, then its
/// extension.
pub fn classify_file(file: &DroppedFile) -> FileClass {
    if crate::pipeline::is_pdf(&file.bytes) {
        return FileClass::Pdf;
    }
    if image::guess_format(&file.bytes).is_ok() {
        return FileClass::Image;
    }

    let mime = file.mime.to_lowercase();
    if SPREADSHEET_MIMES.contains(&mime.as_str()) {
        return FileClass::Spreadsheet;
    }
    if mime == "application/pdf" {
        return FileClass::Pdf;
    }
    if mime.starts_with("image/") {
        return FileClass::Image;
    }

    match extension(&file.name) {
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => FileClass::Spreadsheet,
        Some(ext) if ext == "pdf" => FileClass::Pdf,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => FileClass::Image,
        _ => FileClass::Unsupported,
    }
}

/// Where a payload is headed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Index into [`Payload::files`]
    File { index: usize, class: FileClass },
    SheetsUrl(String),
    Video(String),
    Link(String),
    PassThrough,
}

/// Decide the route for `payload` without side effects.
pub fn route(payload: &Payload) -> Route {
    let recognized = payload
        .files
        .iter()
        .enumerate()
        .map(|(index, file)| (index, classify_file(file)))
        .find(|(_, class)| *class != FileClass::Unsupported);
    if let Some((index, class)) = recognized {
        return Route::File { index, class };
    }
    if !payload.files.is_empty() {
        debug!(files = payload.files.len(), "no supported file in payload");
    }

    let Some(text) = payload.text.as_deref().map(str::trim) else {
        return Route::PassThrough;
    };
    let Some(url) = parse_http_url(text) else {
        return Route::PassThrough;
    };
    let url = url.to_string();

    if is_sheets_url(&url) {
        Route::SheetsUrl(url)
    } else if extract_youtube_id(&url).is_some() {
        Route::Video(url)
    } else {
        Route::Link(url)
    }
}

/// Result of offering a payload to the dispatcher.
#[derive(Debug)]
pub enum Intercept {
    /// The payload was consumed; the engine's default handling must not run.
    Handled(IngestHandle),
    PassThrough,
}

impl Intercept {
    pub fn is_handled(&self) -> bool {
        matches!(self, Intercept::Handled(_))
    }

    pub fn handle(self) -> Option<IngestHandle> {
        match self {
            Intercept::Handled(handle) => Some(handle),
            Intercept::PassThrough => None,
        }
    }
}

/// Route `payload` and start the matching pipeline.
pub fn dispatch<S: CardStore>(pipelines: &Pipelines<S>, mut payload: Payload) -> Intercept {
    let route = route(&payload);
    info!(?route, "payload routed");

    let handle = match route {
        Route::PassThrough => return Intercept::PassThrough,
        Route::File { index, class } => {
            let file = payload.files.swap_remove(index);
            match pipelines.ingest_classified(file, class) {
                Ok(handle) => handle,
                Err(e) => {
                    debug!(error = %e, "file not ingested");
                    return Intercept::PassThrough;
                }
            }
        }
        Route::SheetsUrl(url) => pipelines.ingest_sheets_url(&url).unwrap_or_else(|e| {
            warn!(error = %e, "spreadsheet link rejected, treating as a web link");
            pipelines.ingest_link(&url)
        }),
        Route::Video(url) => pipelines.ingest_video(&url).unwrap_or_else(|e| {
            warn!(error = %e, "video link rejected, treating as a web link");
            pipelines.ingest_link(&url)
        }),
        Route::Link(url) => pipelines.ingest_link(&url),
    };
    Intercept::Handled(handle)
}

impl<S: CardStore> Pipelines<S> {
    /// Ingest one file through the pipeline its contents call for.
    pub fn ingest_file(&self, file: DroppedFile) -> IngestResult<IngestHandle> {
        let class = classify_file(&file);
        self.ingest_classified(file, class)
    }

    fn ingest_classified(&self, file: DroppedFile, class: FileClass) -> IngestResult<IngestHandle> {
        Ok(match class {
            FileClass::Spreadsheet => self.ingest_spreadsheet(&file.name, &file.bytes),
            FileClass::Pdf => self.ingest_pdf(&file.name, file.bytes),
            FileClass::Image => self.ingest_image(&file.name, file.bytes),
            FileClass::Unsupported => return Err(IngestError::UnsupportedFile(file.name)),
        })
    }
}
