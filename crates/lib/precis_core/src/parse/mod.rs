//! Document text extraction.
//!
//! Thin collaborator: two formats, `txt` (raw UTF-8 decode) and `docx`
//! (paragraph concatenation, newline-joined). Everything else is rejected.

mod docx;

use thiserror::Error;

/// Text extraction errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Invalid document: {0}")]
    Invalid(String),
}

/// Extension of a filename (the part after the last dot), if any.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Extract plain text from an uploaded document.
pub fn extract_text(bytes: &[u8], extension: &str) -> Result<String, ParseError> {
    match extension.to_ascii_lowercase().as_str() {
        "txt" => String::from_utf8(bytes.to_vec())
            .map_err(|e| ParseError::Invalid(format!("not valid UTF-8: {e}"))),
        "docx" => docx::extract(bytes),
        other => Err(ParseError::Unsupported(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(file_extension("report.docx"), Some("docx"));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension("no_extension"), None);
    }

    #[test]
    fn txt_is_decoded_verbatim() {
        let text = extract_text("hello\nworld".as_bytes(), "txt").unwrap();
        assert_eq!(text, "hello\nworld");
    }

    #[test]
    fn invalid_utf8_txt_is_rejected() {
        assert!(matches!(
            extract_text(&[0xff, 0xfe, 0x00], "txt"),
            Err(ParseError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            extract_text(b"%PDF-1.4", "pdf"),
            Err(ParseError::Unsupported(_))
        ));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(extract_text(b"ok", "TXT").unwrap(), "ok");
    }
}
