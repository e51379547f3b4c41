//! Stub archive assembly for one MATLAB root.

use anyhow::{bail, Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::analyze::Inspector;
use crate::arch::Arch;
use crate::detect::MatlabRoot;
use crate::error::StubError;
use crate::paths::LibraryIndex;
use crate::resolve::{resolve, Resolution};

/// Libraries every MEX build links against.
pub const CORE_MATLAB_LIBS: [&str; 6] = ["mex", "mx", "eng", "mat", "mwblas", "mwlapack"];

/// Metadata and headers, each kept only if it exists in the root.
pub const BASE_FILES: [&str; 4] = [
    "VersionInfo.xml",
    "appdata/version.xml",
    "appdata/products/*",
    "extern/*",
];

/// Files every stub carries.
pub const REQUIRED_FILES: [&str; 1] = ["bin/*/MATLAB"];

pub const DEFAULT_OUTDIR: &str = "_matlab_stubs";
pub const DEFAULT_STUB_BASE_NAME: &str = "matlab_stub";
pub const STUB_EXT: &str = "tar.bz2";

/// Writes an archive of files below a root directory.
pub trait Archiver {
    /// Archive `files` (relative to `root_dir`) into `output`, storing each
    /// entry under `prefix`.
    fn archive(&self, root_dir: &Path, files: &[String], prefix: &str, output: &Path) -> Result<()>;
}

/// [`Archiver`] that runs GNU `tar` with bzip2 compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    fn archive(&self, root_dir: &Path, files: &[String], prefix: &str, output: &Path) -> Result<()> {
        let output_result = Command::new("tar")
            .arg("-cjf")
            .arg(output)
            .arg(format!("--xform=s:^:{prefix}:"))
            .arg("--")
            .args(files)
            .current_dir(root_dir)
            .output();

        let out = match output_result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StubError::ToolMissing { tool: "tar" }.into())
            }
            Err(e) => return Err(e).context("Failed to run tar"),
        };

        if !out.status.success() {
            return Err(StubError::ToolFailed {
                tool: "tar",
                path: output.to_path_buf(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Settings shared by every root packaged in one run.
#[derive(Debug, Clone)]
pub struct StubOptions {
    pub outdir: PathBuf,
    pub base_name: String,
    pub force: bool,
    /// Library names to seed resolution with.
    pub libs: Vec<String>,
    /// Architectures to package; roots of any other architecture are excluded.
    pub archs: Vec<Arch>,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            base_name: DEFAULT_STUB_BASE_NAME.to_string(),
            force: false,
            libs: CORE_MATLAB_LIBS.iter().map(|s| s.to_string()).collect(),
            archs: Arch::ALL.to_vec(),
        }
    }
}

impl StubOptions {
    /// Archive path for a root: `<outdir>/<base>-<arch>-<version>.tar.bz2`.
    pub fn output_path(&self, root: &MatlabRoot) -> PathBuf {
        self.outdir.join(format!(
            "{}-{}-{}.{}",
            self.base_name, root.arch, root.version, STUB_EXT
        ))
    }
}

/// What happened to one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Written(PathBuf),
    /// The archive already existed and `force` was not set.
    Skipped(PathBuf),
    /// The root's architecture is not among the selected ones.
    Excluded(Arch),
}

/// Resolves and archives MATLAB roots.
pub struct Packager<'a> {
    options: &'a StubOptions,
    inspector: &'a dyn Inspector,
    archiver: &'a dyn Archiver,
}

impl<'a> Packager<'a> {
    pub fn new(
        options: &'a StubOptions,
        inspector: &'a dyn Inspector,
        archiver: &'a dyn Archiver,
    ) -> Self {
        Self {
            options,
            inspector,
            archiver,
        }
    }

    /// Build the stub archive for `root`.
    ///
    /// An existing archive is left untouched unless `force` is set. A
    /// partially written archive is removed if the archiver fails.
    pub fn package(&self, root: &MatlabRoot) -> Result<PackageOutcome> {
        if !self.options.archs.contains(&root.arch) {
            return Ok(PackageOutcome::Excluded(root.arch));
        }
        let output = std::path::absolute(self.options.output_path(root))
            .context("Failed to resolve output path")?;
        if output.is_file() && !self.options.force {
            return Ok(PackageOutcome::Skipped(output));
        }
        fs::create_dir_all(&self.options.outdir).with_context(|| {
            format!("Failed to create {}", self.options.outdir.display())
        })?;

        debug!(
            arch = %root.arch,
            release = root.release,
            version = %root.version,
            root = %root.path.display(),
            "resolving MATLAB"
        );
        let index = LibraryIndex::scan(&root.arch.lib_search_dirs(&root.path))?;
        let resolution = resolve(root.arch, &index, &self.options.libs, self.inspector)?;
        for name in &resolution.unresolved {
            warn!(lib = %name, root = %root.path.display(), "library not found");
        }

        let files: Vec<String> = select_files(root, &resolution)?.into_iter().collect();
        let prefix = format!("{}/{}/", root.arch, root.release);
        debug!(files = files.len(), %prefix, output = %output.display(), "archiving");

        if let Err(e) = self.archiver.archive(&root.path, &files, &prefix, &output) {
            if output.exists() {
                if let Err(rm) = fs::remove_file(&output) {
                    warn!(output = %output.display(), error = %rm, "cannot remove partial archive");
                }
            }
            return Err(e);
        }
        Ok(PackageOutcome::Written(output))
    }
}

/// Root-relative paths to archive: existing base files, required files and
/// the resolved libraries.
pub fn select_files(root: &MatlabRoot, resolution: &Resolution) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();

    for entry in BASE_FILES {
        if root.path.join(entry.replace('*', "")).exists() {
            files.extend(expand(&root.path, entry)?);
        }
    }
    for entry in REQUIRED_FILES {
        let matches = expand(&root.path, entry)?;
        if matches.is_empty() {
            warn!(pattern = entry, root = %root.path.display(), "required file missing");
        }
        files.extend(matches);
    }
    for lib in &resolution.libraries {
        let rel = lib.strip_prefix(&root.path).with_context(|| {
            format!(
                "Library {} is outside MATLAB root {}",
                lib.display(),
                root.path.display()
            )
        })?;
        files.insert(rel.to_string_lossy().into_owned());
    }

    Ok(files)
}

/// Expand a root-relative entry. Entries without `*` are returned as-is.
fn expand(root: &Path, entry: &str) -> Result<Vec<String>> {
    if !entry.contains('*') {
        return Ok(vec![entry.to_string()]);
    }

    let base = Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/{}", base.trim_end_matches('/'), entry);
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut matches = Vec::new();
    for path in glob_with(&pattern, options).with_context(|| format!("Bad pattern {pattern}"))? {
        let path = path?;
        match path.strip_prefix(root) {
            Ok(rel) => matches.push(rel.to_string_lossy().into_owned()),
            Err(_) => bail!("Glob match {} escaped {}", path.display(), root.display()),
        }
    }
    matches.sort();
    Ok(matches)
}
