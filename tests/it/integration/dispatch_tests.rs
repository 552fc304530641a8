//! Paste/drop routing, placement and camera reconciliation.

use crate::helpers::{SCREEN, TestBoardBuilder, card};
use cardboard::error::IngestError;
use cardboard::render::{RenderOutcome, render_guarded};
use cardboard::types::{CardKind, LifecycleStage};
use cardboard::{CardStore, DroppedFile, Payload};

#[tokio::test(start_paused = true)]
async fn test_two_pastes_line_up_without_overlap() {
    let board = TestBoardBuilder::new().build();

    let first = board
        .dispatch(Payload::text("https://youtu.be/dQw4w9WgXcQ"))
        .handle()
        .unwrap();
    assert!(first.task.is_none());
    let first = card(&board, &first.card_id);
    assert_eq!(first.kind(), CardKind::VideoEmbed);
    assert_eq!(first.lifecycle_stage(), LifecycleStage::Loaded);
    // Centred in the 1600x900 viewport
    assert_eq!(first.position, ((SCREEN.0 - 560.0) / 2.0, (SCREEN.1 - 315.0) / 2.0));
    assert_eq!(board.store().camera().x, 0.0);

    let second = board
        .dispatch(Payload::text("https://www.youtube.com/watch?v=9bZkp7q19f0"))
        .handle()
        .unwrap();
    let second = card(&board, &second.card_id);
    assert_eq!(second.position, (first.position.0 + 560.0 + 80.0, first.position.1));
    assert!(!first.bounds().overlaps_x(&second.bounds()));

    // Camera followed the new card
    let camera = board.store().camera();
    let (cx, _) = second.bounds().center();
    assert_eq!((cx + camera.x) * camera.zoom, SCREEN.0 / 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_card_zooms_camera_out() {
    let board = TestBoardBuilder::new().build();
    let id = board
        .dispatch(Payload::files(vec![DroppedFile::new(
            "wide.xlsx",
            "application/vnd.ms-excel",
            b"\xd0\xcf\x11\xe0".to_vec(),
        )]))
        .handle()
        .unwrap()
        .finished()
        .await;
    assert_eq!(card(&board, &id).size.0, 1600.0);
    assert!(board.store().camera().zoom < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_inverted_zoom_config_does_not_panic() {
    let board = TestBoardBuilder::new()
        .with_config(|c| {
            c.min_zoom = 2.0;
            c.max_zoom = 1.0;
        })
        .build();
    for url in ["https://youtu.be/dQw4w9WgXcQ", "https://youtu.be/9bZkp7q19f0"] {
        assert!(board.dispatch(Payload::text(url)).is_handled());
    }
    assert_eq!(board.cards().len(), 2);
    assert!(board.store().camera().zoom <= 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_plain_text_passes_through() {
    let board = TestBoardBuilder::new().build();
    assert!(!board.dispatch(Payload::text("meeting notes for tuesday")).is_handled());
    assert!(!board.dispatch(Payload::default()).is_handled());
    assert!(board.cards().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_files_fall_through_to_text() {
    let board = TestBoardBuilder::new().build();
    let payload = Payload {
        files: vec![DroppedFile::new("notes.docx", "", b"PK\x03\x04".to_vec())],
        text: Some("https://example.com/article".to_string()),
    };
    let id = board.dispatch(payload).handle().unwrap().finished().await;
    assert_eq!(card(&board, &id).kind(), CardKind::LinkPreview);
}

#[tokio::test(start_paused = true)]
async fn test_files_win_over_text() {
    let board = TestBoardBuilder::new().build();
    let payload = Payload {
        files: vec![
            DroppedFile::new("notes.docx", "", vec![]),
            DroppedFile::new("a.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
            DroppedFile::new("b.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
        ],
        text: Some("https://example.com".to_string()),
    };
    let id = board.dispatch(payload).handle().unwrap().finished().await;

    assert_eq!(board.cards().len(), 1);
    let card = card(&board, &id);
    assert_eq!(card.content.as_pdf().unwrap().file_name, "a.pdf");
}

#[tokio::test(start_paused = true)]
async fn test_youtube_text_on_other_host_is_a_link() {
    let board = TestBoardBuilder::new().build();
    let id = board
        .dispatch(Payload::text("https://example.com/share?next=youtu.be/abc"))
        .handle()
        .unwrap()
        .finished()
        .await;
    assert_eq!(card(&board, &id).kind(), CardKind::LinkPreview);
}

#[tokio::test(start_paused = true)]
async fn test_ids_are_namespaced_by_kind() {
    let board = TestBoardBuilder::new().build();
    let video = board
        .dispatch(Payload::text("https://youtu.be/dQw4w9WgXcQ"))
        .handle()
        .unwrap();
    let link = board.dispatch(Payload::text("https://example.com")).handle().unwrap();
    assert!(video.card_id.as_str().starts_with("video_"));
    assert!(link.card_id.as_str().starts_with("link_"));
    link.finished().await;
}

#[tokio::test(start_paused = true)]
async fn test_file_dropped_as_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, b"%PDF-1.7\n").unwrap();

    let board = TestBoardBuilder::new().build();
    let file = DroppedFile::from_path(&path).unwrap();
    assert_eq!(file.name, "report.pdf");
    let id = board.pipelines().ingest_file(file).unwrap().finished().await;
    assert_eq!(card(&board, &id).kind(), CardKind::PdfDocument);

    let missing = DroppedFile::from_path(&dir.path().join("gone.pdf"));
    assert!(matches!(missing, Err(IngestError::Io(_))));
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_file_is_rejected() {
    let board = TestBoardBuilder::new().build();
    let result = board
        .pipelines()
        .ingest_file(DroppedFile::new("notes.docx", "", b"PK\x03\x04".to_vec()));
    assert!(matches!(result, Err(IngestError::UnsupportedFile(name)) if name == "notes.docx"));
    assert!(board.cards().is_empty());
}

#[test]
fn test_render_panic_isolated_per_card() {
    let ids: Vec<cardboard::CardId> = ["a", "b", "c"].into_iter().map(cardboard::CardId::from).collect();
    let outcomes: Vec<RenderOutcome<usize>> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            render_guarded(id, || {
                if i == 1 {
                    panic!("layout overflow");
                }
                i
            })
        })
        .collect();
    assert_eq!(
        outcomes,
        vec![RenderOutcome::Rendered(0), RenderOutcome::Failed, RenderOutcome::Rendered(2)]
    );
}
