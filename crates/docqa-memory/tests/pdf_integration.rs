#![cfg(feature = "pdf")]

use std::fmt::Write as _;
use std::path::Path;

use docqa_memory::document::{SplitterConfig, TextSplitter, load_documents};

/// Single-font PDF with one text line per page; an empty string makes a
/// blank page.
fn write_pdf(path: &Path, pages: &[&str]) {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        String::new(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_owned(),
    ];
    let mut kids = Vec::new();
    for text in pages {
        let page_id = objects.len() + 1;
        kids.push(format!("{page_id} 0 R"));
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }
    objects[1] = format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    );

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1).unwrap();
    }
    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).unwrap();
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n").unwrap();
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    )
    .unwrap();
    std::fs::write(path, out).unwrap();
}

#[tokio::test]
async fn blank_pages_skipped_and_pages_numbered_from_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manual.pdf");
    write_pdf(&path, &["Cover page text", "", "Chapter one text"]);

    let docs = load_documents(&[&path]).await.unwrap();
    assert_eq!(docs.len(), 2);

    assert_eq!(docs[0].metadata.source_file, "manual.pdf");
    assert_eq!(docs[0].metadata.page, 1);
    assert_eq!(docs[0].metadata.content_type, "application/pdf");
    assert!(docs[0].content.contains("Cover page text"));

    assert_eq!(docs[1].metadata.source_file, "manual.pdf");
    assert_eq!(docs[1].metadata.page, 3);
    assert!(docs[1].content.contains("Chapter one text"));
}

#[tokio::test]
async fn pdf_chunks_keep_page_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.pdf");
    let second = dir.path().join("b.pdf");
    write_pdf(&first, &["Alpha", "Beta"]);
    write_pdf(&second, &["", "Gamma"]);

    let docs = load_documents(&[&first, &second]).await.unwrap();
    let chunks = TextSplitter::new(SplitterConfig::default()).split_all(&docs);

    let pages: Vec<(&str, usize)> = chunks
        .iter()
        .map(|c| (c.metadata.source_file.as_str(), c.metadata.page))
        .collect();
    assert_eq!(pages, [("a.pdf", 1), ("a.pdf", 2), ("b.pdf", 2)]);
    assert_eq!(chunks[2].content, "Gamma");
}

#[tokio::test]
async fn pdf_without_text_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    write_pdf(&path, &["", ""]);
    assert!(load_documents(&[&path]).await.is_err());
}
