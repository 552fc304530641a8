//! Spreadsheet pipeline: preview, streaming, enhancement and sheet links.

use crate::helpers::{FakeEnhancer, FakeParser, TestBoardBuilder, csv, relayed, sheet, table, table_of, workbook};
use cardboard::services::EnhancedTable;
use cardboard::types::{CardContent, EnhancementStatus, LifecycleStage, TableSource};
use cardboard::{CardStore, DroppedFile, Payload, StoreEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn xlsx_drop() -> Payload {
    Payload::files(vec![DroppedFile::new("data.xlsx", XLSX_MIME, b"PK\x03\x04fake".to_vec())])
}

fn enhanced(rows: usize, title: Option<&str>) -> EnhancedTable {
    let mut data = table(rows);
    data.columns = vec!["Customer".to_string(), "Total".to_string()];
    EnhancedTable {
        data,
        display_title: title.map(str::to_string),
    }
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_120_rows_stream_in_batches() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Sheet1", 120)]))
        .build();
    let mut events = board.store().subscribe();

    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    let id = handle.card_id.clone();
    let placeholder = table_of(&board, &id);
    assert_eq!(placeholder.rows.len(), 50);
    assert!(placeholder.is_streaming);
    assert_eq!(placeholder.total_rows, 120);
    assert!(placeholder.sheet_names.is_empty());

    // Sample the card between batches
    let mut observed = vec![placeholder.rows.len()];
    while table_of(&board, &id).is_streaming {
        tokio::time::sleep(Duration::from_millis(5)).await;
        observed.push(table_of(&board, &id).rows.len());
    }
    handle.finished().await;

    let done = table_of(&board, &id);
    assert_eq!(done.rows.len(), 120);
    assert!(!done.is_streaming);
    assert_eq!(done.enhancement_status, EnhancementStatus::Failed);
    assert!(observed.contains(&100), "{observed:?}");
    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "{observed:?}");

    let mut revisions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Updated { id: updated, revision } = event {
            if updated == id {
                revisions.push(revision);
            }
        }
    }
    assert!(revisions.len() >= 2);
    assert!(revisions.windows(2).all(|w| w[0] < w[1]), "{revisions:?}");
    assert_eq!(board.store().revision(&id), revisions.last().copied());
}

#[tokio::test(start_paused = true)]
async fn test_small_table_does_not_stream() {
    let board = TestBoardBuilder::new().build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    let placeholder = table_of(&board, &handle.card_id);
    assert_eq!(placeholder.rows.len(), 10);
    assert!(!placeholder.is_streaming);
    handle.finished().await;
}

#[tokio::test(start_paused = true)]
async fn test_deleting_card_mid_stream_cancels_quietly() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Sheet1", 5_000)]))
        .build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    let id = handle.card_id.clone();

    tokio::time::sleep(Duration::from_millis(150)).await;
    let partial = table_of(&board, &id);
    assert!(partial.rows.len() > 50 && partial.rows.len() < 5_000);

    assert!(board.remove(&id));
    handle.finished().await;
    assert!(board.store().get(&id).is_none());
    assert!(board.cards().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_csv_drop_uses_delimited_parser() {
    let board = TestBoardBuilder::new().with_parser(FakeParser::failing()).build();
    let payload = Payload::files(vec![DroppedFile::new("people.csv", "text/csv", csv(70).into_bytes())]);
    let id = board.dispatch(payload).handle().unwrap().finished().await;

    let table = table_of(&board, &id);
    assert_eq!(table.columns, vec!["Name", "Amount"]);
    assert_eq!(table.rows.len(), 70);
    assert!(table.error.is_none());
}

// ============================================================================
// Parse failure
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_parse_failure_is_in_card_error() {
    let board = TestBoardBuilder::new().with_parser(FakeParser::failing()).build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    assert!(handle.task.is_none());

    let card = board.store().get(&handle.card_id).unwrap();
    assert_eq!(card.lifecycle_stage(), LifecycleStage::Errored);
    let table = card.content.as_table().unwrap();
    assert!(table.error.as_deref().unwrap().contains("data.xlsx"));
}

// ============================================================================
// Enhancement
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_enhancement_failure_keeps_standard_rows() {
    let board = TestBoardBuilder::new().with_enhancer(FakeEnhancer::Fail).build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    assert_eq!(
        table_of(&board, &handle.card_id).enhancement_status,
        EnhancementStatus::Running
    );

    let id = handle.finished().await;
    let table = table_of(&board, &id);
    assert_eq!(table.rows.len(), 10);
    assert_eq!(table.columns, vec!["Name", "Amount"]);
    assert_eq!(table.enhancement_status, EnhancementStatus::Failed);
    assert_eq!(table.enhancement_progress, 0);
    assert!(table.enhancement_message.is_empty());
    assert!(table.error.is_none());
    assert_eq!(table.display_title, "data.xlsx");
}

#[tokio::test(start_paused = true)]
async fn test_enhancement_replaces_rows_and_title() {
    let board = TestBoardBuilder::new()
        .with_enhancer(FakeEnhancer::Succeed(enhanced(3, None)))
        .build();
    let id = board.dispatch(xlsx_drop()).handle().unwrap().finished().await;

    let table = table_of(&board, &id);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.columns, vec!["Customer", "Total"]);
    assert_eq!(table.display_title, "Customer Database");
    assert_eq!(table.enhancement_status, EnhancementStatus::Done);
    assert_eq!(table.enhancement_progress, 100);
}

#[tokio::test(start_paused = true)]
async fn test_enhancer_receives_every_row() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Sheet1", 120)]))
        .with_enhancer(FakeEnhancer::Capturing(seen.clone()))
        .build();
    board.dispatch(xlsx_drop()).handle().unwrap().finished().await;

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    let lines: Vec<&str> = seen[0].lines().collect();
    // Sheet marker, header, then all 120 rows
    assert_eq!(lines.len(), 122);
    assert_eq!(lines[0], "SHEET: Sheet1");
    assert!(lines[121].starts_with("row 119"));
}

#[tokio::test(start_paused = true)]
async fn test_large_enhanced_result_is_restreamed() {
    let board = TestBoardBuilder::new()
        .with_enhancer(FakeEnhancer::Succeed(enhanced(130, Some("Quarterly Sales"))))
        .build();
    let id = board.dispatch(xlsx_drop()).handle().unwrap().finished().await;

    let table = table_of(&board, &id);
    assert_eq!(table.rows.len(), 130);
    assert_eq!(table.total_rows, 130);
    assert!(!table.is_streaming);
    assert_eq!(table.display_title, "Quarterly Sales");
}

#[tokio::test(start_paused = true)]
async fn test_progress_ticks_cap_then_result_wins() {
    let board = TestBoardBuilder::new()
        .with_enhancer(FakeEnhancer::After(Duration::from_secs(10), enhanced(3, None)))
        .build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    let id = handle.card_id.clone();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let early = table_of(&board, &id);
    assert_eq!(early.enhancement_status, EnhancementStatus::Running);
    assert!(early.enhancement_progress > 0 && early.enhancement_progress < 90);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(table_of(&board, &id).enhancement_progress, 90);

    handle.finished().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    let done = table_of(&board, &id);
    assert_eq!(done.enhancement_status, EnhancementStatus::Done);
    assert_eq!(done.enhancement_progress, 100);
}

#[tokio::test(start_paused = true)]
async fn test_enhancement_timeout_fails_silently() {
    let board = TestBoardBuilder::new()
        .with_enhancer(FakeEnhancer::After(Duration::from_secs(30), enhanced(3, None)))
        .with_config(|c| c.enhance_timeout_ms = 2_000)
        .build();
    let id = board.dispatch(xlsx_drop()).handle().unwrap().finished().await;

    let table = table_of(&board, &id);
    assert_eq!(table.enhancement_status, EnhancementStatus::Failed);
    assert_eq!(table.rows.len(), 10);
}

// ============================================================================
// Multi-sheet
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_multi_sheet_placeholder_has_tabs() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Q1", 120), sheet("Q2", 5)]))
        .build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();

    let table = table_of(&board, &handle.card_id);
    assert_eq!(table.sheet_names, vec!["Q1", "Q2"]);
    assert_eq!(table.active_sheet.as_deref(), Some("Q1"));
    handle.finished().await;
}

#[tokio::test(start_paused = true)]
async fn test_sheet_data_is_shared_across_reads() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Q1", 2_000), sheet("Q2", 5)]))
        .build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();

    let before = table_of(&board, &handle.card_id);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after = table_of(&board, &handle.card_id);
    assert!(after.rows.len() > before.rows.len());
    assert!(Arc::ptr_eq(&before.sheets, &after.sheets));
    handle.finished().await;
}

#[tokio::test(start_paused = true)]
async fn test_sheet_switch_supersedes_stream() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Q1", 500), sheet("Q2", 5)]))
        .build();
    let handle = board.dispatch(xlsx_drop()).handle().unwrap();
    let ctl = board.controller(&handle.card_id).unwrap();

    tokio::time::sleep(Duration::from_millis(140)).await;
    assert!(ctl.on_sheet_change("Q2"));
    let switched = table_of(&board, &handle.card_id);
    assert_eq!(switched.rows.len(), 5);
    assert_eq!(switched.current_page_index, 0);
    assert!(!switched.is_streaming);

    let id = handle.finished().await;
    let table = table_of(&board, &id);
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.active_sheet.as_deref(), Some("Q2"));
}

#[tokio::test(start_paused = true)]
async fn test_multi_sheet_enhancement_only_retitles() {
    let board = TestBoardBuilder::new()
        .with_workbook(workbook(vec![sheet("Q1", 8), sheet("Q2", 5)]))
        .with_enhancer(FakeEnhancer::Succeed(enhanced(3, Some("Team Budget"))))
        .build();
    let id = board.dispatch(xlsx_drop()).handle().unwrap().finished().await;

    let table = table_of(&board, &id);
    assert_eq!(table.display_title, "Team Budget");
    assert_eq!(table.rows.len(), 8);
    assert_eq!(table.columns, vec!["Name", "Amount"]);
    assert_eq!(table.enhancement_status, EnhancementStatus::Done);
}

// ============================================================================
// Spreadsheet links
// ============================================================================

const SHEET_LINK: &str = "https://docs.google.com/spreadsheets/d/abc123/edit#gid=0";
const SHEET_CSV: &str = "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=0";

#[tokio::test(start_paused = true)]
async fn test_sheet_link_streams_csv() {
    let board = TestBoardBuilder::new().with_page(SHEET_CSV, csv(70)).build();
    let handle = board.dispatch(Payload::text(SHEET_LINK)).handle().unwrap();

    let placeholder = table_of(&board, &handle.card_id);
    assert!(placeholder.is_loading);
    assert!(placeholder.rows.is_empty());
    assert_eq!(placeholder.display_title, "Google Sheet");
    assert!(matches!(placeholder.source, TableSource::SheetsUrl { .. }));

    let id = handle.finished().await;
    let table = table_of(&board, &id);
    assert!(!table.is_loading);
    assert_eq!(table.rows.len(), 70);
    assert!(!table.is_streaming);
    assert_eq!(table.enhancement_status, EnhancementStatus::None);
}

#[tokio::test(start_paused = true)]
async fn test_sheet_link_through_relay() {
    let board = TestBoardBuilder::new().with_page(relayed(SHEET_CSV), csv(3)).build();
    let id = board
        .dispatch(Payload::text(SHEET_LINK))
        .handle()
        .unwrap()
        .finished()
        .await;
    assert_eq!(table_of(&board, &id).rows.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_sheet_link_leaves_notice() {
    let board = TestBoardBuilder::new().build();
    let id = board
        .dispatch(Payload::text(SHEET_LINK))
        .handle()
        .unwrap()
        .finished()
        .await;

    let card = board.store().get(&id).unwrap();
    let CardContent::SpreadsheetTable(table) = &card.content else {
        panic!("expected a table card");
    };
    assert!(table.notice.is_some());
    assert!(table.error.is_none());
    assert!(!table.is_loading);
    assert!(table.rows.is_empty());
    assert_eq!(card.lifecycle_stage(), LifecycleStage::Loaded);
}
