//! Recognizers for pasted URLs.

use reqwest::Url;

/// Parse `text` as an absolute http(s) URL. Surrounding whitespace is
/// ignored; anything containing inner whitespace is not a URL.
pub fn parse_http_url(text: &str) -> Option<Url> {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(text).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

/// Hostname without a leading `www.`, or `"Website"` when there is none.
pub fn host_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.strip_prefix("www.").unwrap_or(h).to_string()))
        .unwrap_or_else(|| "Website".to_string())
}

/// Extract the video id from a YouTube URL.
///
/// Handles `youtu.be/<id>`, `youtube.com/watch?v=<id>` and
/// `youtube.com/embed/<id>` (with or without `www.` / `m.`). Other hosts
/// never match, whatever their path or query contains.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let url = parse_http_url(url)?;
    let host = url.host_str()?;
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            "embed" => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;

    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Spreadsheet id from a `docs.google.com/spreadsheets/d/<id>/...` link.
pub fn sheets_document_id(url: &Url) -> Option<String> {
    if url.host_str() != Some("docs.google.com") {
        return None;
    }
    let mut segments = url.path_segments()?;
    if segments.next()? != "spreadsheets" || segments.next()? != "d" {
        return None;
    }
    segments.next().filter(|id| !id.is_empty()).map(str::to_string)
}

pub fn is_sheets_url(text: &str) -> bool {
    parse_http_url(text)
        .as_ref()
        .and_then(sheets_document_id)
        .is_some()
}

/// CSV export URL for a share link, keeping the `gid` of the shared tab.
pub fn sheets_csv_url(text: &str) -> Option<String> {
    let url = parse_http_url(text)?;
    let id = sheets_document_id(&url)?;

    let gid = url
        .query_pairs()
        .find(|(k, _)| k == "gid")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            url.fragment()
                .and_then(|f| f.split('&').find_map(|p| p.strip_prefix("gid=")))
                .map(str::to_string)
        });

    let mut csv = format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv");
    if let Some(gid) = gid {
        csv.push_str("&gid=");
        csv.push_str(&gid);
    }
    Some(csv)
}
