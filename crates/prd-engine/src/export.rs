//! Document export variants (§6 "File formats"): the same canonical
//! Markdown body rendered into the wire formats a caller may request.

use chrono::{DateTime, Utc};
use prd_store::models::PRDDocument;
use serde::Serialize;

/// §6 export variant a caller may request for a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Html,
    Json,
    Pdf,
    Docx,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// MIME type per RFC for each variant (§6).
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Html => "text/html",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// An exported document ready to hand to a caller: the rendered bytes, the
/// format's MIME type, and the filename §6 prescribes.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `{content, format:"markdown", generatedAt}` (§6 `json` variant).
#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    content: &'a str,
    format: &'static str,
    generated_at: DateTime<Utc>,
}

/// Render `document` into `format` (§6 "File formats").
///
/// # Errors
/// Returns an error only for the `json` variant, if serialization fails.
pub fn export_document(document: &PRDDocument, format: ExportFormat) -> Result<ExportedDocument, serde_json::Error> {
    let bytes = match format {
        ExportFormat::Markdown | ExportFormat::Pdf | ExportFormat::Docx => {
            // pdf/docx carry the canonical content unchanged under their own
            // MIME type (§6: "format-preserving content"); no binary
            // rendering pipeline is in scope for this core.
            document.content.clone().into_bytes()
        }
        ExportFormat::Html => render_html(document).into_bytes(),
        ExportFormat::Json => {
            let payload = JsonExport {
                content: &document.content,
                format: "markdown",
                generated_at: document.generated_at,
            };
            serde_json::to_vec_pretty(&payload)?
        }
    };

    Ok(ExportedDocument {
        filename: filename_for(&document.title, document.generated_at, format),
        content_type: format.content_type(),
        bytes,
    })
}

/// Wrap the canonical Markdown body in a minimal HTML5 skeleton, escaping
/// the original content (§6).
fn render_html(document: &PRDDocument) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(&document.title),
        escape_html(&document.content),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// `<sanitized_title>_<yyyyMMdd_HHmmss>.<ext>` (§6): the sanitized title is
/// restricted to `[A-Za-z0-9_-]`, lower-cased, truncated to 50 characters.
fn filename_for(title: &str, generated_at: DateTime<Utc>, format: ExportFormat) -> String {
    let sanitized = sanitize_title(title);
    format!(
        "{sanitized}_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn sanitize_title(title: &str) -> String {
    let mut out: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    out.truncate(50);
    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use prd_store::models::{DocumentMetadata, PRDSection, SectionType};
    use uuid::Uuid;

    fn sample_document() -> PRDDocument {
        let metadata = DocumentMetadata {
            format: "markdown".into(),
            language: "en".into(),
            word_count: 10,
            estimated_read_time: 1,
            tags: vec![],
            attachments: vec![],
        };
        PRDDocument::new(
            Uuid::new_v4(),
            "Chat App PRD!".into(),
            "# Executive Summary\nbody\n".into(),
            vec![PRDSection {
                order: 0,
                section_type: SectionType::ExecutiveSummary,
                title: "Executive Summary".into(),
                content: "body".into(),
            }],
            metadata,
            0.9,
            "anthropic".into(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn json_round_trip_preserves_markdown_byte_for_byte() {
        let document = sample_document();
        let exported = export_document(&document, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&exported.bytes).unwrap();
        assert_eq!(value["content"].as_str().unwrap(), document.content);
        assert_eq!(value["format"].as_str().unwrap(), "markdown");
    }

    #[test]
    fn html_export_escapes_content() {
        let mut document = sample_document();
        document.content = "<script>alert(1)</script>".into();
        let exported = export_document(&document, ExportFormat::Html).unwrap();
        let html = String::from_utf8(exported.bytes).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn filename_sanitizes_and_lowercases_title() {
        let document = sample_document();
        let exported = export_document(&document, ExportFormat::Markdown).unwrap();
        assert!(exported.filename.starts_with("chat_app_prd_"));
        assert!(exported.filename.ends_with(".md"));
    }

    #[test]
    fn filename_truncates_to_fifty_characters_before_suffix() {
        let mut document = sample_document();
        document.title = "a".repeat(100);
        let exported = export_document(&document, ExportFormat::Markdown).unwrap();
        let stem = exported.filename.split('_').next().unwrap();
        assert!(stem.len() <= 50);
    }
}
