//! Turning files on disk into [`Document`]s
//!
//! PDFs yield one document per page, anything else is read as UTF-8 text.
//!
//! # Usage
//!
//! ```ignore
//! use pdfrag_lib::loader::{load_all, FileLoader};
//!
//! let docs = load_all(&FileLoader, &["PDFs/BERT.pdf", "notes.txt"])?;
//! ```

use std::path::Path;

use crate::document::Document;
use crate::Result;

/// Trait for document sources
pub trait DocumentLoader: Send + Sync {
    /// Load a file into an ordered sequence of documents
    fn load(&self, path: &Path) -> Result<Vec<Document>>;
}

/// Picks a loader from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            PdfLoader.load(path)
        } else {
            TextLoader.load(path)
        }
    }
}

/// Load every path in order and concatenate the documents.
pub fn load_all<L, P>(loader: &L, paths: &[P]) -> Result<Vec<Document>>
where
    L: DocumentLoader + ?Sized,
    P: AsRef<Path>,
{
    let mut documents = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let docs = loader.load(path)?;
        tracing::debug!(path = %path.display(), documents = docs.len(), "loaded");
        documents.extend(docs);
    }
    Ok(documents)
}

mod pdf;
mod text;

pub use pdf::*;
pub use text::*;
