//! Document ingestion: loads whole `.txt` files from the corpus directory.

use std::path::Path;

use glob::Pattern;

use crate::error::Error;

/// One corpus unit: a text file loaded whole, tagged with its file name.
/// `embedding` stays `None` until the index performs its one-time
/// assignment; documents are never mutated after that.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub source_label: String,
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(content: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_label: source_label.into(),
            embedding: None,
        }
    }
}

/// Load every matching text unit from `data_dir`, one `Document` per file.
///
/// `filter` is a literal filename prefix selecting a sub-topic (e.g.
/// `"launchpool"` matches `launchpool*.txt`); `None` loads every `.txt`.
/// Files are visited in sorted filename order so insertion order, and
/// therefore rank tie-breaking, is deterministic. An unreadable directory
/// or file fails; a directory with zero matches is an empty corpus, and
/// answering degrades to empty-context behavior downstream.
pub fn load_documents(data_dir: &Path, filter: Option<&str>) -> Result<Vec<Document>, Error> {
    let pattern = file_pattern(filter)?;

    tracing::info!("Loading documents from {}", data_dir.display());

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if pattern.matches(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut documents = Vec::with_capacity(names.len());
    for name in names {
        let content = std::fs::read_to_string(data_dir.join(&name))?;
        tracing::debug!("Loaded {name} ({} bytes)", content.len());
        documents.push(Document::new(content, name));
    }

    tracing::info!("Loaded {} documents", documents.len());
    Ok(documents)
}

/// Build the `{prefix}*.txt` match pattern. The prefix is escaped so a
/// filter is always a literal name prefix, never a glob expression.
fn file_pattern(filter: Option<&str>) -> Result<Pattern, Error> {
    let prefix = filter.map(Pattern::escape).unwrap_or_default();
    Pattern::new(&format!("{prefix}*.txt"))
        .map_err(|e| Error::InvalidArgument(format!("bad document filter: {e}")))
}
