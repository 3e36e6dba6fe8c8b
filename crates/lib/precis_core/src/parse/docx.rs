//! docx extraction: paragraphs from `word/document.xml`.
//!
//! Pulls `<w:t>` runs out of the main document part with a small scanner;
//! the surrounding XML structure is never interpreted beyond paragraph and
//! text-run boundaries.

use std::io::{Cursor, Read};

use super::ParseError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a docx file, newline-joined.
pub fn extract(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::Invalid(format!("not a docx container: {e}")))?;
    let mut document = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ParseError::Invalid(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut document)
        .map_err(|e| ParseError::Invalid(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let paragraphs: Vec<String> = document
        .split("</w:p>")
        .filter(|chunk| chunk.contains("<w:p"))
        .map(paragraph_text)
        .collect();
    Ok(paragraphs.join("\n"))
}

/// Concatenate the `<w:t>` runs inside one paragraph chunk.
fn paragraph_text(chunk: &str) -> String {
    let mut text = String::new();
    let mut rest = chunk;
    while let Some(start) = rest.find("<w:t") {
        rest = &rest[start + 4..];
        // Tag may carry attributes (e.g. xml:space) or be self-closing.
        let Some(tag_end) = rest.find('>') else { break };
        let self_closing = rest[..tag_end].ends_with('/');
        rest = &rest[tag_end + 1..];
        if self_closing {
            continue;
        }
        let Some(close) = rest.find("</w:t>") else { break };
        text.push_str(&unescape(&rest[..close]));
        rest = &rest[close + 6..];
    }
    text
}

/// Decode the XML entities that can appear in document text.
fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn paragraphs_are_newline_joined() {
        let bytes = build_docx(
            "<w:document><w:body>\
             <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>\
             </w:body></w:document>",
        );
        let text = extract(&bytes).unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn entities_and_attributed_runs_are_handled() {
        let bytes = build_docx(
            "<w:document><w:body>\
             <w:p><w:r><w:t xml:space=\"preserve\">a &amp; b</w:t></w:r></w:p>\
             <w:p><w:r><w:t/></w:r></w:p>\
             </w:body></w:document>",
        );
        let text = extract(&bytes).unwrap();
        assert_eq!(text, "a & b\n");
    }

    #[test]
    fn non_zip_bytes_are_invalid() {
        assert!(matches!(
            extract(b"plain text, not a zip"),
            Err(ParseError::Invalid(_))
        ));
    }

    #[test]
    fn zip_without_document_part_is_invalid() {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        writer.finish().unwrap();
        let bytes = cursor.into_inner();
        assert!(matches!(extract(&bytes), Err(ParseError::Invalid(_))));
    }
}
