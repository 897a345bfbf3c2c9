use pagevoice_core::document::{FORM_FEED, PlainTextBackend};
use pagevoice_core::speech::MockSpeechBackend;
use pagevoice_core::{
    Extractor, PagevoiceError, PlaybackController, SpeechBackendKind, SpeechState,
    create_speech_backend, event_channel,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn write_document(dir: &tempfile::TempDir, pages: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join("doc.txt");
    let separator = FORM_FEED.to_string();
    fs::write(&path, pages.join(&separator)).unwrap();
    path
}

#[test]
fn extracts_and_normalizes_a_page_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(
        &dir,
        &["intro page", "Let $\\alpha$ be   small", "and \\beta large", "appendix"],
    );

    let result = Extractor::new(PlainTextBackend::new()).extract_range(&path, 2, 3);

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.page_range.start_page, 2);
    assert_eq!(result.page_range.end_page, 3);
    assert_eq!(result.page_range.total_pages, 4);
    assert!(result.full_text.contains("--- Page 2 ---"));
    assert!(result.full_text.contains("--- Page 3 ---"));
    assert!(result.full_text.contains("Let alpha be small"));
    assert!(result.full_text.contains("and beta large"));
    assert!(!result.full_text.contains("intro"));
    assert!(!result.full_text.contains("appendix"));
    assert!(!result.is_chunked);
}

#[test]
fn blank_pages_are_an_empty_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(&dir, &["words here", "   ", "more"]);

    let extractor = Extractor::new(PlainTextBackend::new());
    let result = extractor.try_extract_range(&path, 2, 2);
    assert!(matches!(
        result,
        Err(PagevoiceError::EmptyExtraction { start: 2, end: 2 })
    ));

    let result = extractor.extract_range(&path, 1, 3);
    assert!(result.success);
    assert!(!result.full_text.contains("--- Page 2 ---"));

    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "  \n\t ").unwrap();
    let result = Extractor::new(PlainTextBackend::new()).extract_all(&empty);
    assert!(!result.success);
    assert!(matches!(
        result.error(),
        Some(PagevoiceError::EmptyExtraction { .. })
    ));
}

#[test]
fn missing_file_is_an_invalid_document() {
    let dir = tempfile::tempdir().unwrap();
    let result = Extractor::new(PlainTextBackend::new()).extract_all(&dir.path().join("nope.txt"));
    assert!(!result.success);
    assert!(matches!(
        result.error(),
        Some(PagevoiceError::InvalidDocument(_))
    ));
    assert!(result.full_text.is_empty());
    assert!(result.chunks.is_empty());
}

#[test]
fn long_documents_play_chunk_by_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
    let path = write_document(&dir, &[&words.join(" ")]);

    let result = Extractor::new(PlainTextBackend::new())
        .with_chunk_threshold(10)
        .extract_all(&path);
    assert!(result.success);
    assert!(result.is_chunked);
    // the page marker adds four words
    let counts: Vec<usize> = result.chunks.iter().map(|c| c.word_count).collect();
    assert_eq!(counts, vec![10, 10, 9]);

    let (sink, events) = event_channel();
    let mut controller = PlaybackController::new(MockSpeechBackend::new(sink), events);
    let finished = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&finished);
    controller.on_finished(move || {
        f.fetch_add(1, Ordering::SeqCst);
    });

    assert!(controller.speak_chunked(result.chunks.clone(), 0));
    for _ in 0..3 {
        controller.backend().emit_started();
        controller.backend().emit_finished();
        controller.pump();
    }

    assert_eq!(controller.state(), SpeechState::Stopped);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    let spoken = controller.backend().spoken().join(" ");
    assert_eq!(spoken, result.full_text.split_whitespace().collect::<Vec<_>>().join(" "));
}

#[test]
fn pause_while_stopped_does_nothing() {
    let (sink, events) = event_channel();
    let mut controller = PlaybackController::new(MockSpeechBackend::new(sink), events);
    let paused = Arc::new(AtomicUsize::new(0));
    let p = Arc::clone(&paused);
    controller.on_paused(move || {
        p.fetch_add(1, Ordering::SeqCst);
    });

    controller.pause();

    assert_eq!(controller.state(), SpeechState::Stopped);
    assert_eq!(paused.load(Ordering::SeqCst), 0);
    assert!(controller.backend().calls().is_empty());
}

#[tokio::test]
async fn silent_backend_runs_to_completion() {
    let (sink, events) = event_channel();
    let backend = create_speech_backend(SpeechBackendKind::Silent, sink).unwrap();
    let mut controller = PlaybackController::new(backend, events);
    let started = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&started);
    controller.on_started(move || {
        s.fetch_add(1, Ordering::SeqCst);
    });

    assert!(controller.speak_chunked(vec!["one".into(), "two".into()], 0));
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        controller.run_until_stopped(),
    )
    .await
    .unwrap();

    assert_eq!(controller.state(), SpeechState::Stopped);
    assert_eq!(started.load(Ordering::SeqCst), 2);
    assert_eq!(controller.overall_progress(), 0.0);
}
