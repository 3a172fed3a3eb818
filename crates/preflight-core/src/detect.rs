//! File format classification.
//!
//! Extension first; content signature as a fallback for files uploaded
//! with a wrong or missing extension.

use std::path::Path;

use crate::error::EngineError;

/// Input formats the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Docx,
    Odt,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
            FileFormat::Odt => "odt",
        }
    }
}

/// Classify an uploaded file, failing with `UnsupportedFormat` when
/// neither the extension nor the content is recognizable.
pub fn detect_format(file_name: &str, bytes: &[u8]) -> Result<FileFormat, EngineError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => return Ok(FileFormat::Pdf),
        Some("docx") => return Ok(FileFormat::Docx),
        Some("odt") => return Ok(FileFormat::Odt),
        _ => {}
    }

    if let Some(format) = sniff_content(bytes) {
        return Ok(format);
    }

    Err(EngineError::UnsupportedFormat(
        extension.unwrap_or_else(|| "(none)".to_string()),
    ))
}

/// Recognize a format from the first bytes. DOCX and ODT are both ZIP
/// containers; they are told apart by well-known entry names in the
/// archive's leading section.
fn sniff_content(bytes: &[u8]) -> Option<FileFormat> {
    if bytes.starts_with(b"%PDF-") {
        return Some(FileFormat::Pdf);
    }

    if bytes.starts_with(b"PK\x03\x04") {
        let head = &bytes[..bytes.len().min(4096)];
        if contains(head, b"word/") {
            return Some(FileFormat::Docx);
        }
        if contains(head, b"application/vnd.oasis.opendocument.text") {
            return Some(FileFormat::Odt);
        }
    }

    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_by_extension() {
        assert_eq!(detect_format("thesis.pdf", &[]).unwrap(), FileFormat::Pdf);
        assert_eq!(detect_format("thesis.DOCX", &[]).unwrap(), FileFormat::Docx);
        assert_eq!(detect_format("thesis.odt", &[]).unwrap(), FileFormat::Odt);
    }

    #[test]
    fn test_falls_back_to_pdf_signature() {
        let bytes = b"%PDF-1.7\n%...";
        assert_eq!(detect_format("upload.bin", bytes).unwrap(), FileFormat::Pdf);
    }

    #[test]
    fn test_falls_back_to_zip_entry_names() {
        let mut docx = b"PK\x03\x04".to_vec();
        docx.extend_from_slice(b"....word/document.xml....");
        assert_eq!(detect_format("upload", &docx).unwrap(), FileFormat::Docx);

        let mut odt = b"PK\x03\x04".to_vec();
        odt.extend_from_slice(b"mimetypeapplication/vnd.oasis.opendocument.text");
        assert_eq!(detect_format("upload", &odt).unwrap(), FileFormat::Odt);
    }

    #[test]
    fn test_unknown_format_fails() {
        let err = detect_format("notes.txt", b"plain text").unwrap_err();
        match err {
            EngineError::UnsupportedFormat(ext) => assert_eq!(ext, "txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
