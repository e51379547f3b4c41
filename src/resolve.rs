//! Transitive shared-library closure over a MATLAB library index.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::analyze::Inspector;
use crate::arch::Arch;
use crate::paths::LibraryIndex;

/// Result of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Full paths of every library reachable from the seeds, seeds included.
    pub libraries: BTreeSet<PathBuf>,
    /// Seed names that matched no indexed file.
    pub unresolved: Vec<String>,
    /// Dependency names not present in the index; assumed to be system
    /// libraries outside the MATLAB tree.
    pub external: BTreeSet<String>,
}

/// Resolve seed library names and collect everything they depend on.
///
/// Seed names are matched with [`LibraryIndex::resolve_name`]. Dependencies
/// are followed only while they map back into `index`. The result is the
/// same set whatever order the worklist is drained in, and dependency
/// cycles terminate.
///
/// # Errors
///
/// Fails if the inspector fails on any library.
pub fn resolve<S: AsRef<str>>(
    arch: Arch,
    index: &LibraryIndex,
    seeds: &[S],
    inspector: &dyn Inspector,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    let mut to_process: BTreeSet<PathBuf> = BTreeSet::new();

    for seed in seeds {
        let seed = seed.as_ref();
        match index.resolve_name(seed) {
            Some(path) => {
                trace!(seed, path = %path.display(), "resolved seed");
                to_process.insert(path.to_path_buf());
            }
            None => resolution.unresolved.push(seed.to_string()),
        }
    }

    while let Some(lib) = to_process.pop_first() {
        let deps = inspector
            .direct_dependencies(arch, &lib)
            .with_context(|| format!("Failed to read dependencies of {}", lib.display()))?;

        for dep in deps {
            match index.get(&dep) {
                Some(path) => {
                    if path != lib.as_path() && !resolution.libraries.contains(path) {
                        to_process.insert(path.to_path_buf());
                    }
                }
                None => {
                    resolution.external.insert(dep);
                }
            }
        }
        resolution.libraries.insert(lib);
    }

    debug!(
        libraries = resolution.libraries.len(),
        unresolved = resolution.unresolved.len(),
        external = resolution.external.len(),
        "resolved library closure"
    );
    Ok(resolution)
}
