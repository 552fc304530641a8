//! OpenAI-compatible chat completion client used for table enhancement.

use super::{EnhancedTable, Enhancer};
use crate::config::EnhancerConfig;
use crate::constants::ENHANCE_SAMPLE_ROWS;
use crate::error::{ServiceError, ServiceResult};
use crate::types::TableData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const TEMPERATURE: f32 = 0.1;

const SYSTEM_PROMPT: &str = "You are an Excel/spreadsheet file processor specialized in extracting \
clean tabular data from messy Excel content. Always return valid JSON arrays with no additional \
text or formatting.";

fn user_prompt(raw_text: &str) -> String {
    format!(
        "You are an Excel file processor agent.\n\
Your job is to take an uploaded Excel file as input and return a clean, structured table.\n\
- Identify the main data table in the file.\n\
- Remove unnecessary rows or columns such as footers, headers, descriptions, or notes.\n\
- Preserve only meaningful tabular data.\n\
- If the file has multiple pages, please extract the data from all pages.\n\
- Normalize the table so that column headers are clear and rows contain consistent values.\n\
\n\
Excel Data:\n\
{raw_text}\n\
\n\
Return ONLY a JSON array of objects where each object represents one row of data:"
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`Enhancer`] backed by a chat completions endpoint.
pub struct OpenAiEnhancer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiEnhancer {
    pub fn new(config: &EnhancerConfig, api_key: String) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Read the API key from the env var named in `config`.
    pub fn from_env(config: &EnhancerConfig) -> ServiceResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ServiceError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::new(config, api_key)
    }

    async fn complete(&self, raw_text: &str) -> ServiceResult<String> {
        let prompt = user_prompt(raw_text);
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 {
            warn!("Enhancement service rejected the API key");
        }
        if status != 200 {
            return Err(ServiceError::Status { status });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::MalformedResponse("empty completion".to_string()))
    }
}

#[async_trait]
impl Enhancer for OpenAiEnhancer {
    async fn enhance(&self, raw_text: &str, file_name: &str) -> ServiceResult<EnhancedTable> {
        if raw_text.trim().is_empty() {
            return Err(ServiceError::MalformedResponse("nothing to enhance".to_string()));
        }
        let sample = sample_raw_text(raw_text, ENHANCE_SAMPLE_ROWS);
        debug!(file_name, chars = sample.len(), model = %self.model, "requesting enhancement");
        let reply = self.complete(&sample).await?;
        let data = parse_table_reply(&reply)?;
        Ok(EnhancedTable {
            data,
            display_title: None,
        })
    }
}

/// Keep each sheet's `SHEET:` line, its header and at most `max_rows` data
/// rows, so prompts stay small for large workbooks.
pub fn sample_raw_text(raw_text: &str, max_rows: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    // Lines seen since the last `SHEET:` marker; the first is the header
    let mut since_marker: Option<usize> = None;

    for line in raw_text.lines() {
        if line.starts_with("SHEET: ") {
            since_marker = Some(0);
            kept.push(line);
            continue;
        }
        if line.is_empty() {
            kept.push(line);
            continue;
        }
        match since_marker.as_mut() {
            Some(seen) => {
                if *seen <= max_rows {
                    kept.push(line);
                }
                *seen += 1;
            }
            None => kept.push(line),
        }
    }
    kept.join("\n")
}

/// Remove markdown code fences around a model reply.
pub fn strip_code_fences(reply: &str) -> String {
    reply
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a reply that must be a non-empty JSON array of row objects.
pub fn parse_table_reply(reply: &str) -> ServiceResult<TableData> {
    let cleaned = strip_code_fences(reply);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    let Value::Array(records) = value else {
        return Err(ServiceError::MalformedResponse("reply is not an array".to_string()));
    };
    if records.is_empty() {
        return Err(ServiceError::MalformedResponse("reply has no rows".to_string()));
    }
    TableData::from_records(&records)
        .ok_or_else(|| ServiceError::MalformedResponse("rows are not objects".to_string()))
}
