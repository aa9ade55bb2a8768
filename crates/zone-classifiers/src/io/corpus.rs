//! JSON corpus of segmented, labeled documents.
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{ClassifierError, Result};
use crate::structure::Document;

/// Files in `dir` whose extension equals `ext`, sorted by file name.
pub fn discover_documents<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let ext = ext.trim_start_matches('.');
    let entries = fs::read_dir(dir).map_err(|e| ClassifierError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ClassifierError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |e| e == ext) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Parse one document and resolve its page statistics.
///
/// Documents without an id take their file stem.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
    let mut document: Document = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ClassifierError::corpus(path, e.to_string()))?;

    if document.id.is_none() {
        document.id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    document.resolve_statistics();
    Ok(document)
}

/// Load every document with extension `ext` from `dir`.
pub fn load_corpus<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let paths = discover_documents(dir, ext)?;
    if paths.is_empty() {
        log::warn!(
            "[ZoneClassifier::Corpus] No *.{} documents in {}",
            ext.trim_start_matches('.'),
            dir.display()
        );
    }

    let documents = paths
        .iter()
        .map(load_document)
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "[ZoneClassifier::Corpus] Loaded {} documents from {}",
        documents.len(),
        dir.display()
    );
    Ok(documents)
}
