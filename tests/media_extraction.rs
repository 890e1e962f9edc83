//! End-to-end classification of synthesized document fixtures.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use gemini_tg::media::classify_file;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Build a two-page PDF whose pages carry the given strings.
fn write_pdf(path: &Path, page_texts: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(page_texts.len()).expect("page count");
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("pdf saved");
}

/// Build a minimal DOCX: a zip with one `word/document.xml`.
fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .expect("zip entry");
        writer.write_all(xml.as_bytes()).expect("zip content");
        writer.finish().expect("zip finished");
    }
    std::fs::write(path, cursor.into_inner()).expect("docx saved");
}

fn decoded_text(path: &Path) -> String {
    let payload = classify_file(path).expect("payload");
    assert_eq!(payload.mime_type.as_deref(), Some("text/plain"));
    let bytes = BASE64.decode(payload.data).expect("valid base64");
    String::from_utf8(bytes).expect("utf-8 text")
}

#[test]
fn pdf_pages_are_concatenated_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.pdf");
    write_pdf(&path, &["alpha page text", "omega page text"]);

    let text = decoded_text(&path);
    let first = text.find("alpha page text").expect("first page text");
    let second = text.find("omega page text").expect("second page text");
    assert!(first < second);
}

#[test]
fn docx_paragraphs_are_joined_by_newlines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.docx");
    write_docx(&path, &["First paragraph.", "Second paragraph."]);

    assert_eq!(decoded_text(&path), "First paragraph.\nSecond paragraph.");
}

#[test]
fn docx_without_document_xml_is_unreadable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("odd.docx");

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("unrelated.txt", SimpleFileOptions::default())
            .expect("zip entry");
        writer.write_all(b"nothing here").expect("zip content");
        writer.finish().expect("zip finished");
    }
    std::fs::write(&path, cursor.into_inner()).expect("file saved");

    assert!(classify_file(&path).is_err());
}

#[test]
fn image_bytes_survive_the_base64_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("photo.jpg");
    let original: Vec<u8> = (0u8..=255).collect();
    std::fs::write(&path, &original).expect("file saved");

    let payload = classify_file(&path).expect("payload");
    assert_eq!(payload.mime_type.as_deref(), Some("image/jpeg"));
    assert_eq!(BASE64.decode(payload.data).expect("valid base64"), original);
}
