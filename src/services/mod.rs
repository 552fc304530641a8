//! External collaborators consumed by the ingestion pipelines.
//!
//! Each collaborator sits behind a trait so the embedder (and the tests) can
//! substitute their own. The in-crate implementations are:
//!
//! - [`DelimitedParser`]: CSV/TSV workbooks
//! - [`OpenAiEnhancer`]: OpenAI-compatible chat completion client
//! - [`ReqwestFetcher`]: plain HTTP GET for pages and relays

pub mod delimited;
pub mod fetch;
pub mod metadata;
pub mod openai;
pub mod relay;
pub mod title;

use crate::error::{IngestResult, ServiceResult};
use crate::types::{TableData, Workbook};
use async_trait::async_trait;

pub use delimited::DelimitedParser;
pub use fetch::ReqwestFetcher;
pub use metadata::LinkMetadata;
pub use openai::OpenAiEnhancer;
pub use relay::{Fetched, RelayChain, first_success};
pub use title::generate_title_from_data;

/// Spreadsheet-binary parser: bytes to one row sequence per sheet.
pub trait WorkbookParser: Send + Sync {
    fn parse(&self, file_name: &str, bytes: &[u8]) -> IngestResult<Workbook>;
}

/// Cleaned table returned by an [`Enhancer`]
#[derive(Clone, Debug, PartialEq)]
pub struct EnhancedTable {
    pub data: TableData,
    /// Left empty by services that do not name the table
    pub display_title: Option<String>,
}

/// AI enhancement service.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// `raw_text` is the full tab-separated text produced by
    /// [`Workbook::to_raw_text`]; implementations sample it as they need.
    async fn enhance(&self, raw_text: &str, file_name: &str) -> ServiceResult<EnhancedTable>;
}

/// Fetches a page body as text.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> ServiceResult<String>;
}
