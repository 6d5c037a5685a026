use std::fs;
use std::path::Path;

use serde_json::json;

use crate::document::{Document, Metadata};
use crate::loader::DocumentLoader;
use crate::{Error, Result};

/// Page-level PDF text extraction using pdf-extract.
///
/// Produces one document per page with `source`, `page` (0-indexed) and
/// `total_pages` metadata. Blank pages are kept so page numbers line up with
/// the file; they simply produce no chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let load_error = |reason: String| Error::Load {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| load_error(e.to_string()))?;
        let text =
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| load_error(e.to_string()))?;

        let pages = split_pages(&text);
        if pages.len() == 1 {
            tracing::warn!(
                path = %path.display(),
                "no page breaks found, treating the whole PDF as one page"
            );
        }

        let source = path.display().to_string();
        let total = pages.len();
        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(page, content)| {
                let mut metadata = Metadata::new();
                metadata.insert("source".into(), json!(source));
                metadata.insert("page".into(), json!(page));
                metadata.insert("total_pages".into(), json!(total));
                Document::with_metadata(content, metadata)
            })
            .collect())
    }
}

/// Split extracted text on form feeds, which pdf-extract emits between pages.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0C').map(str::to_string).collect();

    // a trailing form feed closes the last page rather than opening a new one
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
