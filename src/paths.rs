//! Library search directories and the file-name to path index built from them.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Naming conventions tried, in order, when resolving a library name.
const NAME_VARIANTS: [(&str, &str); 6] = [
    ("", ""),
    ("lib", ""),
    ("", ".so"),
    ("lib", ".so"),
    ("", ".dll"),
    ("lib", ".dll"),
];

/// Maps bare file names found in library search directories to full paths.
///
/// When the same name appears in more than one directory, the directory
/// scanned last wins.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index by listing each directory in order.
    ///
    /// Directories that do not exist are skipped.
    pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> Result<Self> {
        let mut index = Self::new();
        for dir in dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "library search dir missing");
                continue;
            }
            for entry in
                fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
            {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                index.insert(name, entry.path());
            }
        }
        debug!(entries = index.len(), "built library index");
        Ok(index)
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(name.into(), path.into());
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the indexed file for a short library name such as `mx`.
    ///
    /// Tries `mx`, `libmx`, `mx.so`, `libmx.so`, `mx.dll`, `libmx.dll` and
    /// accepts the first that is indexed and has a file extension, so an
    /// extensionless executable never stands in for a library.
    #[must_use = "resolved library path should be used"]
    pub fn resolve_name(&self, name: &str) -> Option<&Path> {
        NAME_VARIANTS.iter().find_map(|(prefix, suffix)| {
            let candidate = format!("{prefix}{name}{suffix}");
            let path = self.get(&candidate)?;
            has_extension(&candidate).then_some(path)
        })
    }
}

fn has_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| !ext.is_empty())
}
