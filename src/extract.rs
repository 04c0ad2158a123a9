//! Per-format text extraction for uploaded documents.
//!
//! Dispatch is by file extension; each extractor returns plain UTF-8 text as
//! one or more [`PageText`] values. Only PDF carries real page structure;
//! the other formats produce a single page with `page = None`.

use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::models::PageText;

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract text from a document file, dispatching on its extension.
///
/// Supported: `.pdf`, `.docx`, `.md`, `.html`/`.htm`, `.txt`. Anything else
/// fails with [`Error::UnsupportedFormat`] before any I/O happens.
pub fn extract_file(path: &Path) -> Result<Vec<PageText>, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => extract_pdf(path),
        "docx" => extract_docx(path),
        "md" => extract_markdown(path),
        "html" | "htm" => extract_html(path),
        "txt" => extract_txt(path),
        other => Err(Error::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

fn extract_pdf(path: &Path) -> Result<Vec<PageText>, Error> {
    let text =
        pdf_extract::extract_text(path).map_err(|e| Error::Extraction(e.to_string()))?;

    // Some PDFs come back with form-feed page separators; keep the page
    // numbers when they do, otherwise treat the whole text as page 1.
    let pages: Vec<PageText> = text
        .split('\u{c}')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(idx, page_text)| PageText {
            text: page_text.to_string(),
            page: Some(idx as i64 + 1),
        })
        .collect();

    Ok(pages)
}

fn extract_docx(path: &Path) -> Result<Vec<PageText>, Error> {
    let bytes = std::fs::read(path).map_err(|e| Error::Extraction(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| Error::Extraction(e.to_string()))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| Error::Extraction("word/document.xml not found".to_string()))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| Error::Extraction(e.to_string()))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(Error::Extraction(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
    }

    let text = docx_paragraph_text(&doc_xml)?;
    Ok(single_page(text))
}

/// Walk `w:t` text runs, inserting a newline at each paragraph end.
fn docx_paragraph_text(xml: &[u8]) -> Result<String, Error> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text_run => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                } else if e.local_name().as_ref() == b"p" && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::Extraction(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn extract_markdown(path: &Path) -> Result<Vec<PageText>, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Extraction(e.to_string()))?;
    Ok(single_page(strip_markdown(&raw)))
}

/// Line-oriented markdown stripping: drops heading/list/quote markers,
/// fenced-code delimiters, and emphasis/code punctuation, and rewrites
/// `[label](url)` links to their label.
fn strip_markdown(raw: &str) -> String {
    let mut out = String::new();
    let mut in_fence = false;

    for line in raw.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let stripped = trimmed
            .trim_start_matches('#')
            .trim_start_matches('>')
            .trim_start_matches(['-', '*', '+'])
            .trim_start();

        let mut cleaned = String::with_capacity(stripped.len());
        let mut chars = stripped.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' | '_' | '`' => {}
                '[' => {
                    // Copy the link label, then skip the (url) part if present.
                    let mut label = String::new();
                    for lc in chars.by_ref() {
                        if lc == ']' {
                            break;
                        }
                        label.push(lc);
                    }
                    cleaned.push_str(&label);
                    if chars.peek() == Some(&'(') {
                        for lc in chars.by_ref() {
                            if lc == ')' {
                                break;
                            }
                        }
                    }
                }
                _ => cleaned.push(c),
            }
        }

        out.push_str(cleaned.trim());
        out.push('\n');
    }

    out
}

fn extract_html(path: &Path) -> Result<Vec<PageText>, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Extraction(e.to_string()))?;
    Ok(single_page(html_text(&raw)?))
}

/// Collect text events, skipping script/style bodies.
fn html_text(raw: &str) -> Result<String, Error> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(raw.as_bytes());
    reader.config_mut().trim_text(true);
    // HTML in the wild is rarely well-formed XML; tolerate mismatched tags.
    reader.config_mut().check_end_names = false;
    let mut buf = Vec::new();
    let mut skip_depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"script" || name.as_ref() == b"style" {
                    skip_depth += 1;
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                let name = e.local_name();
                if (name.as_ref() == b"script" || name.as_ref() == b"style") && skip_depth > 0 {
                    skip_depth -= 1;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if skip_depth == 0 => {
                let text = te.unescape().unwrap_or_default();
                if !text.trim().is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(text.trim());
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::Extraction(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn extract_txt(path: &Path) -> Result<Vec<PageText>, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Extraction(e.to_string()))?;
    Ok(single_page(raw))
}

fn single_page(text: String) -> Vec<PageText> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![PageText { text, page: None }]
    }
}
