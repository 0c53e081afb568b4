//! Text Extractor: raw document bytes + declared format -> plain text.
//!
//! Output is not sanitized or truncated here; bounding the text for the
//! scoring prompt is the analyzer's concern.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse PDF file: {0}")]
    Pdf(String),

    #[error("failed to parse Word document: {0}")]
    Docx(String),
}

/// Recognized document formats. `Doc` is routed through the DOCX decoding
/// path; a genuine pre-2007 binary file fails there with a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Unsupported,
}

impl DocumentFormat {
    pub fn from_mime(mime: &str) -> DocumentFormat {
        if mime.contains("pdf") {
            DocumentFormat::Pdf
        } else if mime.contains("wordprocessingml") {
            DocumentFormat::Docx
        } else if mime.contains("msword") {
            DocumentFormat::Doc
        } else {
            DocumentFormat::Unsupported
        }
    }

    pub fn from_extension(filename: &str) -> DocumentFormat {
        match extension_of(filename) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => DocumentFormat::Pdf,
            Some(ext) if ext.eq_ignore_ascii_case("docx") => DocumentFormat::Docx,
            Some(ext) if ext.eq_ignore_ascii_case("doc") => DocumentFormat::Doc,
            _ => DocumentFormat::Unsupported,
        }
    }

    /// The declared MIME classification wins; the filename extension is the
    /// fallback when the classification is absent or not recognized.
    pub fn resolve(declared_mime: Option<&str>, filename: &str) -> DocumentFormat {
        match declared_mime.map(Self::from_mime) {
            Some(DocumentFormat::Unsupported) | None => Self::from_extension(filename),
            Some(format) => format,
        }
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    let idx = filename.rfind('.')?;
    let ext = &filename[idx + 1..];
    (!ext.is_empty()).then_some(ext)
}

/// Extracts plain text from `data` according to the resolved format.
///
/// A decode failure surfaces as an error carrying the decoder's message; this
/// never returns empty text for a genuinely unreadable document.
pub fn extract_text(
    data: &[u8],
    declared_mime: Option<&str>,
    filename: &str,
) -> Result<String, ExtractError> {
    match DocumentFormat::resolve(declared_mime, filename) {
        DocumentFormat::Pdf => extract_pdf(data),
        DocumentFormat::Docx | DocumentFormat::Doc => extract_docx(data),
        DocumentFormat::Unsupported => {
            let offending = declared_mime
                .map(str::to_string)
                .or_else(|| extension_of(filename).map(str::to_string))
                .unwrap_or_else(|| filename.to_string());
            Err(ExtractError::UnsupportedFormat(offending))
        }
    }
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    // A structurally valid PDF with no text layer (image-only scan) must not
    // flow downstream as an empty resume.
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Pdf("no text layer in document".to_string()));
    }
    Ok(trimmed.to_string())
}

fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(data).map_err(|e| ExtractError::Docx(format!("{e:?}")))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        match run_child {
                            RunChild::Text(t) => text.push_str(&t.text),
                            RunChild::Tab(_) => text.push(' '),
                            RunChild::Break(_) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    fn docx_bytes(lines: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for line in lines {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)));
        }
        let mut buffer = Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).expect("pack docx fixture");
        buffer.into_inner()
    }

    #[test]
    fn test_declared_mime_wins_over_extension() {
        let format = DocumentFormat::resolve(Some("application/pdf"), "resume.docx");
        assert_eq!(format, DocumentFormat::Pdf);
    }

    #[test]
    fn test_unknown_mime_falls_back_to_extension() {
        let format = DocumentFormat::resolve(Some("application/octet-stream"), "resume.docx");
        assert_eq!(format, DocumentFormat::Docx);
    }

    #[test]
    fn test_missing_mime_falls_back_to_extension() {
        assert_eq!(
            DocumentFormat::resolve(None, "resume.PDF"),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::resolve(None, "legacy.doc"),
            DocumentFormat::Doc
        );
    }

    #[test]
    fn test_unsupported_format_names_declared_mime() {
        let err = extract_text(b"\xff\xd8\xff", Some("image/jpeg"), "photo.jpg").unwrap_err();
        match err {
            ExtractError::UnsupportedFormat(format) => assert_eq!(format, "image/jpeg"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_format_names_extension_without_mime() {
        let err = extract_text(b"GIF89a", None, "photo.gif").unwrap_err();
        match err {
            ExtractError::UnsupportedFormat(format) => assert_eq!(format, "gif"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_pdf_is_an_extraction_error_not_empty_text() {
        let err = extract_text(b"definitely not a pdf", Some("application/pdf"), "cv.pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_docx_text_is_extracted_per_paragraph() {
        let data = docx_bytes(&["Jane Doe", "Senior Rust Engineer"]);
        let text = extract_text(
            &data,
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            "Jane_Doe_Resume.docx",
        )
        .unwrap();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("Senior Rust Engineer"));
    }

    #[test]
    fn test_doc_routes_through_docx_decoder() {
        // A zip-based document with a .doc name and msword mime decodes fine.
        let data = docx_bytes(&["Legacy Name"]);
        let text = extract_text(&data, Some("application/msword"), "legacy.doc").unwrap();
        assert!(text.contains("Legacy Name"));
    }

    #[test]
    fn test_binary_doc_fails_with_decode_error() {
        let err =
            extract_text(b"\xd0\xcf\x11\xe0 old word", Some("application/msword"), "old.doc")
                .unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }
}
