//! Link preview metadata: title, description, favicon, summary and
//! screenshot URLs scraped from a fetched page.

use crate::constants::{MAX_DESCRIPTION_CHARS, MAX_PAGE_TEXT_CHARS, MAX_SUMMARY_CHARS, MAX_TITLE_CHARS};
use crate::urls::host_label;
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::LazyLock;

const DEFAULT_TITLE: &str = "Website";
const DEFAULT_DESCRIPTION: &str = "No description available";
const FALLBACK_DESCRIPTION: &str = "Click to visit website";

/// Descriptions inside this range are used as the summary as-is
const DESCRIPTION_SUMMARY_CHARS: std::ops::Range<usize> = 31..200;
/// Page text shorter than this is not summarised
const MIN_TEXT_CHARS: usize = 101;
const MIN_PARAGRAPH_CHARS: usize = 51;
const PARAGRAPH_SUMMARY_CHARS: usize = 200;
const MIN_SUMMARY_CHARS: usize = 30;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(meta|link)\b([^>]*)>").expect("valid regex literal"));
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex literal")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex literal"));
static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "nav", "header", "footer", "noscript"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).expect("valid regex literal"))
        .collect()
});
static MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(main|article)\b[^>]*>(.*?)</(?:main|article)\s*>").expect("valid regex literal"));
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("valid regex literal"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex literal"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex literal"));
static SECTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Z\s]+\s*[:|]\s*").expect("valid regex literal"));
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex literal"));

/// Scraped page metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkMetadata {
    pub title: String,
    pub description: String,
    pub favicon_url: Option<String>,
}

/// Metadata used when the page could not be fetched.
pub fn fallback_metadata(url: &str) -> LinkMetadata {
    LinkMetadata {
        title: host_label(url),
        description: FALLBACK_DESCRIPTION.to_string(),
        favicon_url: None,
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

fn attributes(raw: &str) -> HashMap<String, String> {
    ATTR.captures_iter(raw)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_lowercase();
            let value = c.get(2).or_else(|| c.get(3))?.as_str();
            Some((name, decode_entities(value)))
        })
        .collect()
}

/// First non-empty `content` of a meta tag whose `attr` equals `key`.
fn meta_content(tags: &[(String, HashMap<String, String>)], attr: &str, key: &str) -> Option<String> {
    tags.iter()
        .filter(|(tag, _)| tag == "meta")
        .find(|(_, attrs)| attrs.get(attr).is_some_and(|v| v.eq_ignore_ascii_case(key)))
        .and_then(|(_, attrs)| attrs.get("content"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn link_href(tags: &[(String, HashMap<String, String>)], rel: &str) -> Option<String> {
    tags.iter()
        .filter(|(tag, _)| tag == "link")
        .find(|(_, attrs)| attrs.get("rel").is_some_and(|v| v.eq_ignore_ascii_case(rel)))
        .and_then(|(_, attrs)| attrs.get("href"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a favicon href against the page origin.
fn absolute_favicon(href: &str, page: &Url) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    let origin = page.origin().ascii_serialization();
    if href.starts_with("//") {
        format!("{}:{href}", page.scheme())
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

/// Cut to `max` characters, ending with `...` when shortened.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Parse title, description and favicon out of `html` fetched from `url`.
pub fn parse_metadata(html: &str, url: &str) -> LinkMetadata {
    let Ok(page) = Url::parse(url) else {
        return fallback_metadata(url);
    };

    let tags: Vec<(String, HashMap<String, String>)> = TAG
        .captures_iter(html)
        .map(|c| (c[1].to_lowercase(), attributes(&c[2])))
        .collect();

    let title = meta_content(&tags, "property", "og:title")
        .or_else(|| meta_content(&tags, "name", "twitter:title"))
        .or_else(|| {
            TITLE
                .captures(html)
                .map(|c| decode_entities(c[1].trim()))
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let description = meta_content(&tags, "property", "og:description")
        .or_else(|| meta_content(&tags, "name", "twitter:description"))
        .or_else(|| meta_content(&tags, "name", "description"))
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let favicon_url = link_href(&tags, "icon")
        .or_else(|| link_href(&tags, "shortcut icon"))
        .or_else(|| meta_content(&tags, "property", "og:image"))
        .map(|href| absolute_favicon(&href, &page));

    LinkMetadata {
        title: truncate_chars(&title, MAX_TITLE_CHARS).trim().to_string(),
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS).trim().to_string(),
        favicon_url,
    }
}

/// Readable text of the page's main content, whitespace-collapsed.
pub fn extract_text(html: &str) -> String {
    let mut cleaned = html.to_string();
    for noise in NOISE.iter() {
        cleaned = noise.replace_all(&cleaned, " ").into_owned();
    }

    let content = MAIN
        .captures(&cleaned)
        .and_then(|c| c.get(2))
        .or_else(|| BODY.captures(&cleaned).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| cleaned.clone());

    let text = ANY_TAG.replace_all(&content, " ");
    let text = decode_entities(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().chars().take(MAX_PAGE_TEXT_CHARS).collect()
}

/// Whole sentences that fit in `max` characters, or a hard cut.
fn sentence_truncate(paragraph: &str, max: usize) -> String {
    let mut out = String::new();
    for sentence in SENTENCE_END.split(paragraph) {
        if out.chars().count() + sentence.chars().count() > max {
            break;
        }
        out.push_str(sentence);
        out.push('.');
    }
    if out.is_empty() {
        truncate_chars(paragraph, max)
    } else {
        out
    }
}

/// One-paragraph summary of a page.
///
/// Uses the description when it is a reasonable length, otherwise the first
/// substantial stretch of page text, otherwise a sentence built from the
/// title and host. Always at most 180 characters and ends in punctuation.
pub fn generate_summary(url: &str, title: &str, description: &str, page_text: &str) -> String {
    let mut summary = String::new();

    if DESCRIPTION_SUMMARY_CHARS.contains(&description.chars().count()) {
        summary = description.to_string();
    } else if page_text.chars().count() >= MIN_TEXT_CHARS {
        let paragraph = SECTION_LABEL.replace(page_text.trim(), "");
        let paragraph = WHITESPACE.replace_all(paragraph.trim(), " ");
        if paragraph.chars().count() >= MIN_PARAGRAPH_CHARS {
            summary = if paragraph.chars().count() > PARAGRAPH_SUMMARY_CHARS {
                sentence_truncate(&paragraph, PARAGRAPH_SUMMARY_CHARS)
            } else {
                paragraph.into_owned()
            };
        }
    }

    if summary.chars().count() < MIN_SUMMARY_CHARS {
        let clean_title: String = title.chars().filter(|c| !matches!(c, '|' | '–' | '—')).collect();
        let clean_title = clean_title.trim();
        let clean_title = if clean_title.is_empty() { "this website" } else { clean_title };
        summary = format!(
            "{clean_title} provides information and services related to {}.",
            host_label(url)
        );
    }

    let summary = WHITESPACE.replace_all(summary.trim(), " ");
    let mut summary = truncate_chars(&summary, MAX_SUMMARY_CHARS);
    if !summary.ends_with(['.', '!', '?']) {
        summary.push('.');
    }
    summary
}

/// Primary screenshot preview for a link card.
pub fn screenshot_url(url: &str) -> String {
    format!(
        "https://s0.wp.com/mshots/v1/{}?w=400&h=225",
        urlencoding::encode(url)
    )
}

/// Backup screenshot service used after the primary image fails.
pub fn fallback_screenshot_url(url: &str) -> String {
    format!(
        "https://api.apiflash.com/v1/urltoimage?access_key=demo&url={}&width=400&height=225&format=jpeg&quality=85&response_type=image",
        urlencoding::encode(url)
    )
}
