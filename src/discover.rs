//! Recursive search for MATLAB roots below candidate directories.

use anyhow::Result;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::detect::{detect, MatlabRoot};

/// A discovery session.
///
/// Remembers every directory it has looked at, so each directory is inspected
/// at most once for the lifetime of the session, even across several calls
/// to [`Discovery::roots`]. Paths are compared by their exact string, so
/// `/opt/m` and `/opt/m/` are two different directories here.
#[derive(Debug, Default)]
pub struct Discovery {
    visited: HashSet<OsString>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `dir` has already been looked at in this session.
    pub fn has_visited(&self, dir: &Path) -> bool {
        self.visited.contains(dir.as_os_str())
    }

    /// Lazily walk `candidates` depth-first, yielding every MATLAB root found.
    ///
    /// A recognised root is not searched further for nested installations.
    /// Directories that are not roots are searched through their immediate
    /// subdirectories, without a depth limit.
    pub fn roots<I, P>(&mut self, candidates: I) -> Roots<'_>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut stack: Vec<PathBuf> = candidates.into_iter().map(Into::into).collect();
        stack.reverse();
        Roots {
            visited: &mut self.visited,
            stack,
        }
    }
}

/// Iterator returned by [`Discovery::roots`].
///
/// Yields `Err` when a directory carries a marker that cannot be read or names
/// an unknown version; the caller decides whether to keep going.
pub struct Roots<'a> {
    visited: &'a mut HashSet<OsString>,
    stack: Vec<PathBuf>,
}

impl Iterator for Roots<'_> {
    type Item = Result<MatlabRoot>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(dir) = self.stack.pop() {
            if !self.visited.insert(dir.as_os_str().to_os_string()) {
                continue;
            }
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "not a directory, skipping");
                continue;
            }

            let info = match detect(&dir) {
                Ok(info) => info,
                Err(e) => return Some(Err(e)),
            };

            if info.is_root() {
                match info.into_root(dir.clone()) {
                    Some(root) => {
                        debug!(dir = %dir.display(), arch = %root.arch, version = %root.version, "found MATLAB root");
                        return Some(Ok(root));
                    }
                    None => {
                        warn!(dir = %dir.display(), "MATLAB root without a readable version, skipping");
                        continue;
                    }
                }
            }

            match subdirectories(&dir) {
                Ok(children) => self.stack.extend(children.into_iter().rev()),
                Err(e) => warn!(dir = %dir.display(), error = %e, "cannot list directory"),
            }
        }
        None
    }
}

/// Immediate subdirectories of `dir`, sorted by path.
fn subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Arch;
    use crate::detect::VERSION_INFO_FILE;
    use crate::error::StubError;
    use tempfile::TempDir;

    fn make_root(path: &Path, version: &str, arch: &str) {
        fs::create_dir_all(path.join("bin").join(arch)).unwrap();
        fs::write(
            path.join(VERSION_INFO_FILE),
            format!("<version>{version}</version>"),
        )
        .unwrap();
    }

    fn collect(discovery: &mut Discovery, candidates: &[PathBuf]) -> Vec<MatlabRoot> {
        discovery
            .roots(candidates.iter().cloned())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_finds_nested_roots_in_order() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        make_root(&base.join("a/R2018b"), "9.5", "glnxa64");
        make_root(&base.join("b/deep/er/R2019a"), "9.6", "win64");
        fs::create_dir_all(base.join("c/empty")).unwrap();

        let mut discovery = Discovery::new();
        let roots = collect(&mut discovery, &[base.to_path_buf()]);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].path, base.join("a/R2018b"));
        assert_eq!(roots[0].arch, Arch::Glnxa64);
        assert_eq!(roots[1].path, base.join("b/deep/er/R2019a"));
        assert_eq!(roots[1].release, "r2019a");
    }

    #[test]
    fn test_does_not_descend_into_root() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("outer");
        make_root(&outer, "9.5", "glnxa64");
        make_root(&outer.join("toolbox/inner"), "9.6", "glnxa64");

        let mut discovery = Discovery::new();
        let roots = collect(&mut discovery, &[outer.clone()]);

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].path, outer);
        assert!(!discovery.has_visited(&outer.join("toolbox")));
    }

    #[test]
    fn test_second_pass_is_empty() {
        let temp = TempDir::new().unwrap();
        make_root(&temp.path().join("m"), "9.5", "glnxa64");
        let candidates = vec![temp.path().to_path_buf()];

        let mut discovery = Discovery::new();
        assert_eq!(collect(&mut discovery, &candidates).len(), 1);
        assert!(collect(&mut discovery, &candidates).is_empty());
    }

    #[test]
    fn test_duplicate_candidates_visited_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("m");
        make_root(&root, "9.5", "glnxa64");

        let mut discovery = Discovery::new();
        let roots = collect(
            &mut discovery,
            &[root.clone(), temp.path().to_path_buf(), root.clone()],
        );
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_visited_by_exact_path_string() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("m");
        make_root(&root, "9.5", "glnxa64");
        let with_slash = PathBuf::from(format!("{}/", root.display()));

        let mut discovery = Discovery::new();
        let roots = collect(&mut discovery, &[root.clone(), with_slash.clone()]);

        assert_eq!(roots.len(), 2);
        assert!(discovery.has_visited(&root));
        assert!(discovery.has_visited(&with_slash));
        assert!(!discovery.has_visited(&temp.path().join("./m")));
    }

    #[test]
    fn test_missing_and_file_candidates_skipped() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let mut discovery = Discovery::new();
        let roots = collect(&mut discovery, &[temp.path().join("nope"), file]);
        assert!(roots.is_empty());
    }

    #[test]
    fn test_unknown_version_yields_error() {
        let temp = TempDir::new().unwrap();
        make_root(&temp.path().join("m"), "99.9", "glnxa64");

        let mut discovery = Discovery::new();
        let err = discovery
            .roots([temp.path().to_path_buf()])
            .find_map(|r| r.err())
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<StubError>(),
            Some(StubError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn test_unsupported_arch_yields_error() {
        let temp = TempDir::new().unwrap();
        let products = temp.path().join("mac/R2018b").join(crate::detect::PRODUCTS_DIR);
        fs::create_dir_all(&products).unwrap();
        fs::write(products.join("MATLAB 9.5 maci64 1234.xml"), "").unwrap();

        let mut discovery = Discovery::new();
        let result: Result<Vec<_>> = discovery.roots([temp.path()]).collect();
        assert!(matches!(
            result.unwrap_err().downcast_ref::<StubError>(),
            Some(StubError::UnsupportedArch(token)) if token == "maci64"
        ));
    }

    #[test]
    fn test_root_without_version_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("m");
        fs::create_dir_all(root.join("bin/glnxa64")).unwrap();
        fs::write(root.join(VERSION_INFO_FILE), "<version>unknown</version>").unwrap();
        make_root(&root.join("nested"), "9.5", "glnxa64");

        let mut discovery = Discovery::new();
        assert!(collect(&mut discovery, &[root]).is_empty());
    }
}
