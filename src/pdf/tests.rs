use super::*;

#[test]
fn test_probe_text_page() {
    let doc = MemoryDocument::from_texts(["Criterion 1 Quality\n".repeat(10)]);

    let probe = probe_page(&doc, 0).unwrap();

    assert_eq!(probe.page_index, 0);
    assert!(probe.native_chars > MIN_NATIVE_TEXT_CHARS);
    assert_eq!(probe.text_blocks, 1);
    assert_eq!(probe.image_blocks, 0);
    assert!(!probe.scanned);
    assert!(!is_scanned_page(&doc, 0));
}

#[test]
fn test_probe_scanned_page() {
    let doc = MemoryDocument::new(vec![MemoryPage::scanned(100, 140)]);

    let probe = probe_page(&doc, 0).unwrap();

    assert_eq!(probe.native_chars, 0);
    assert_eq!(probe.image_blocks, 1);
    assert!(probe.scanned);
    assert!(is_scanned_page(&doc, 0));
}

#[test]
fn test_short_text_without_images_not_scanned() {
    let doc = MemoryDocument::from_texts(["Page 3"]);

    let probe = probe_page(&doc, 0).unwrap();

    assert!(probe.native_chars <= MIN_NATIVE_TEXT_CHARS);
    assert!(!probe.scanned);
}

#[test]
fn test_threshold_boundary_counts_as_scanned() {
    let exactly = "x".repeat(MIN_NATIVE_TEXT_CHARS);
    let doc = MemoryDocument::new(vec![
        MemoryPage::scanned(10, 10).with_text(exactly.clone()),
        MemoryPage::scanned(10, 10).with_text(format!("{exactly}x")),
    ]);

    assert!(is_scanned_page(&doc, 0));
    assert!(!is_scanned_page(&doc, 1));
}

#[test]
fn test_probe_out_of_range() {
    let doc = MemoryDocument::from_texts(["only page"]);

    let err = probe_page(&doc, 3).unwrap_err();
    assert!(matches!(
        err,
        PdfError::PageOutOfRange { index: 3, count: 1 }
    ));
    assert!(!is_scanned_page(&doc, 3));
}

#[tokio::test]
async fn test_memory_render_records_calls() {
    let doc = MemoryDocument::new(vec![MemoryPage::text("abc"), MemoryPage::scanned(8, 8)]);

    assert!(doc.render_page(0, 200).await.is_err());
    let image = doc.render_page(1, 200).await.unwrap();

    assert_eq!(image.width(), 8);
    assert_eq!(doc.rendered_pages(), vec![0, 1]);
}

#[test]
fn test_block_rect_dimensions() {
    let rect = BlockRect {
        x0: 10.0,
        y0: 20.0,
        x1: 110.0,
        y1: 70.0,
    };
    assert_eq!(rect.width(), 100.0);
    assert_eq!(rect.height(), 50.0);
}
