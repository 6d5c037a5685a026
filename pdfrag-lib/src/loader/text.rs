use std::fs;
use std::path::Path;

use serde_json::json;

use crate::document::{Document, Metadata};
use crate::loader::DocumentLoader;
use crate::{Error, Result};

/// Reads a UTF-8 file as a single document.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let content = fs::read_to_string(path).map_err(|e| Error::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(path.display().to_string()));

        Ok(vec![Document::with_metadata(content, metadata)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "# Title\n\nbody").unwrap();

        let docs = TextLoader.load(&path).unwrap();
        assert_eq!(docs[0].source(), Some(path.display().to_string().as_str()));
        assert_eq!(docs[0].content, "# Title\n\nbody");
    }

    #[test]
    fn test_missing_file() {
        let err = TextLoader.load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
