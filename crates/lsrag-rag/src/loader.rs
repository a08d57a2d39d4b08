//! Corpus loading from plain-text files

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lsrag_core::{Document, Error, Result};

/// Documents loaded from the configured paths
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    missing: Vec<PathBuf>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            missing: Vec::new(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Raw text bodies, parallel to `documents()`
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The single warning describing every missing path, if any
    pub fn missing_warning(&self) -> Option<String> {
        if self.missing.is_empty() {
            return None;
        }
        let names: Vec<String> = self
            .missing
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        Some(Error::MissingDocument(names.join(", ")).to_string())
    }
}

/// Loads the corpus from a fixed list of paths
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    paths: Vec<PathBuf>,
}

impl CorpusLoader {
    pub fn new<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            paths: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Read every existing path; missing paths are reported once and skipped
    pub fn load(&self) -> Result<Corpus> {
        let mut corpus = Corpus::default();

        for (position, path) in self.paths.iter().enumerate() {
            match read_utf8(path)? {
                Some(text) => corpus.documents.push(Document::from_position(
                    position,
                    text,
                    Some(path.display().to_string()),
                )),
                None => corpus.missing.push(path.clone()),
            }
        }

        if let Some(warning) = corpus.missing_warning() {
            tracing::warn!("{}", warning);
        }
        tracing::info!("Processed {} documents ready for retrieval", corpus.len());

        Ok(corpus)
    }
}

/// `None` when the file does not exist
fn read_utf8(path: &Path) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| Error::Encoding(path.display().to_string()))
}
