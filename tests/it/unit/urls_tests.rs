//! Unit tests for the URL recognizers.

use cardboard::urls::{extract_youtube_id, is_sheets_url, parse_http_url, sheets_csv_url};

#[test]
fn test_parse_http_url_trims() {
    let url = parse_http_url("  https://example.com/page\n").unwrap();
    assert_eq!(url.as_str(), "https://example.com/page");
    assert!(parse_http_url("").is_none());
    assert!(parse_http_url("example.com").is_none());
    assert!(parse_http_url("mailto:a@b.c").is_none());
}

#[test]
fn test_sheets_detection() {
    assert!(is_sheets_url("https://docs.google.com/spreadsheets/d/1AbC/edit?usp=sharing"));
    assert!(!is_sheets_url("https://docs.google.com/document/d/1AbC/edit"));
    assert!(!is_sheets_url("https://drive.google.com/spreadsheets/d/1AbC"));
    assert!(!is_sheets_url("https://docs.google.com/spreadsheets/d/"));
}

#[test]
fn test_sheets_csv_url_without_gid() {
    assert_eq!(
        sheets_csv_url("https://docs.google.com/spreadsheets/d/1AbC/edit?usp=sharing").as_deref(),
        Some("https://docs.google.com/spreadsheets/d/1AbC/export?format=csv")
    );
}

#[test]
fn test_sheets_csv_url_gid_from_query() {
    assert_eq!(
        sheets_csv_url("https://docs.google.com/spreadsheets/d/1AbC/edit?gid=7").as_deref(),
        Some("https://docs.google.com/spreadsheets/d/1AbC/export?format=csv&gid=7")
    );
}

#[test]
fn test_youtube_rejects_empty_id() {
    assert_eq!(extract_youtube_id("https://youtu.be/"), None);
    assert_eq!(extract_youtube_id("https://www.youtube.com/watch?list=abc"), None);
}

#[test]
fn test_youtube_forms() {
    for url in [
        "https://youtu.be/dQw4w9WgXcQ?t=42",
        "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtube.com/embed/dQw4w9WgXcQ/",
    ] {
        assert_eq!(extract_youtube_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
    }
}

#[test]
fn test_youtube_requires_youtube_host() {
    assert_eq!(extract_youtube_id("https://example.com/share?next=youtu.be/abc"), None);
    assert_eq!(extract_youtube_id("https://example.com/youtube.com/watch?v=abc"), None);
    assert_eq!(extract_youtube_id("https://notyoutube.com/watch?v=abc"), None);
}
