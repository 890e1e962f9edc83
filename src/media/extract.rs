//! Attachment classification and text extraction.
//!
//! The precedence ladder mirrors what the generation endpoint can
//! actually consume: native media types go through as raw bytes,
//! documents are reduced to plain text, everything else is passed
//! along untyped and left to the request builder to drop.

use crate::media::{MediaError, MediaPayload};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use mime_guess::mime;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

const TEXT_PLAIN: &str = "text/plain";

/// Classify a downloaded attachment and produce its inline payload.
///
/// Precedence: image/audio/video MIME prefix, then `.pdf`, `.docx` and
/// plain-text extensions, then raw bytes with the guessed MIME type
/// (which may be unknown).
///
/// # Errors
///
/// Returns a `MediaError` when the file cannot be read or its text
/// cannot be extracted; callers degrade that to "no usable media".
pub fn classify_file(path: &Path) -> Result<MediaPayload, MediaError> {
    let guessed = mime_guess::from_path(path).first();

    if let Some(mime_type) = &guessed {
        let top = mime_type.type_();
        if top == mime::IMAGE || top == mime::AUDIO || top == mime::VIDEO {
            let bytes = std::fs::read(path)?;
            return Ok(MediaPayload {
                data: BASE64.encode(bytes),
                mime_type: Some(mime_type.essence_str().to_string()),
            });
        }
    }

    match extension_of(path).as_deref() {
        Some("pdf") => Ok(text_payload(pdf_text(path)?)),
        Some("docx") => Ok(text_payload(docx_text(path)?)),
        Some("log" | "txt" | "py") => {
            let bytes = std::fs::read(path)?;
            let text = String::from_utf8_lossy(&bytes);
            if text.is_empty() {
                return Err(MediaError::EmptyText);
            }
            Ok(text_payload(text.into_owned()))
        }
        _ => {
            let bytes = std::fs::read(path)?;
            Ok(MediaPayload {
                data: BASE64.encode(bytes),
                mime_type: guessed.map(|m| m.essence_str().to_string()),
            })
        }
    }
}

fn text_payload(text: String) -> MediaPayload {
    MediaPayload {
        data: BASE64.encode(text),
        mime_type: Some(TEXT_PLAIN.to_string()),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Concatenated text of every page of a PDF.
fn pdf_text(path: &Path) -> Result<String, MediaError> {
    let doc = lopdf::Document::load(path).map_err(|e| MediaError::Pdf(e.to_string()))?;
    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc
            .extract_text(&[*page_number])
            .map_err(|e| MediaError::Pdf(e.to_string()))?;
        text.push_str(&page_text);
    }
    Ok(text)
}

/// Paragraph text of a DOCX, joined by newlines.
///
/// A DOCX is a zip archive; the paragraphs live as `w:t` runs inside
/// `word/document.xml`.
fn docx_text(path: &Path) -> Result<String, MediaError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| MediaError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| MediaError::Docx(e.to_string()))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| MediaError::Docx(e.to_string()))?
        {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Text(t) if in_text_run => {
                let run = t.unescape().map_err(|e| MediaError::Docx(e.to_string()))?;
                current.push_str(&run);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

/// Sanitize an attachment filename by stripping path components and
/// replacing dangerous characters.
///
/// Handles both / and \ as separators because filenames may originate
/// from any client OS.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let name = if name.is_empty() { "file" } else { name };

    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}
