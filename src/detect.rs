//! Recognise a MATLAB root directory and read its version and architecture.
//!
//! Two markers are understood, checked in order:
//!
//! 1. `VersionInfo.xml` at the root, holding a `<version>X.Y</version>` tag.
//!    The architecture comes from which `bin/<arch>` directory exists.
//! 2. `appdata/products/`, holding files named
//!    `MATLAB <version> <arch> <build>.xml`.
//!
//! The second marker is only consulted when the first file is absent.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::arch::Arch;
use crate::release::release_for;

pub const VERSION_INFO_FILE: &str = "VersionInfo.xml";
pub const PRODUCTS_DIR: &str = "appdata/products";

static VERSION_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<version>(?P<vers>[0-9]+\.[0-9]+)").expect("valid regex"));

static PRODUCTS_FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"MATLAB (?P<vers>[0-9.]+) (?P<arch>[A-Za-z0-9_]+) [0-9]+\.xml").expect("valid regex")
});

/// What [`detect`] learned about a directory. All fields are `None` when the
/// directory carries neither marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub arch: Option<Arch>,
    pub version: Option<String>,
    pub release: Option<&'static str>,
}

impl DirectoryInfo {
    /// Whether the directory should be treated as a MATLAB root.
    pub fn is_root(&self) -> bool {
        self.arch.is_some()
    }

    /// Build a [`MatlabRoot`] if architecture, version and release are all known.
    pub fn into_root(self, path: PathBuf) -> Option<MatlabRoot> {
        Some(MatlabRoot {
            path,
            arch: self.arch?,
            version: self.version?,
            release: self.release?,
        })
    }
}

/// One discovered MATLAB installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatlabRoot {
    pub path: PathBuf,
    pub arch: Arch,
    /// Dotted numeric version, e.g. `9.5`.
    pub version: String,
    /// Release label, e.g. `r2018b`.
    pub release: &'static str,
}

/// Inspect `dir` for MATLAB root markers.
///
/// # Errors
///
/// Fails if a marker exists but cannot be read, if the version found has
/// no known release label ([`crate::StubError::UnknownVersion`]), or if a
/// products file names an architecture outside [`Arch::ALL`]
/// ([`crate::StubError::UnsupportedArch`]).
pub fn detect(dir: &Path) -> Result<DirectoryInfo> {
    let version_file = dir.join(VERSION_INFO_FILE);
    let products_dir = dir.join(PRODUCTS_DIR);

    if version_file.is_file() {
        detect_from_version_info(dir, &version_file)
    } else if products_dir.is_dir() {
        detect_from_products(&products_dir)
    } else {
        Ok(DirectoryInfo::default())
    }
}

fn detect_from_version_info(dir: &Path, version_file: &Path) -> Result<DirectoryInfo> {
    let bytes = fs::read(version_file)
        .with_context(|| format!("Failed to read {}", version_file.display()))?;
    let contents = String::from_utf8_lossy(&bytes);

    let mut info = DirectoryInfo::default();
    if let Some(vers) = parse_version_tag(&contents) {
        info.release = Some(release_for(vers)?);
        info.version = Some(vers.to_string());
    }
    info.arch = Arch::ALL
        .into_iter()
        .find(|arch| dir.join("bin").join(arch.as_str()).is_dir());

    debug!(dir = %dir.display(), ?info, "detected from version info");
    Ok(info)
}

fn detect_from_products(products_dir: &Path) -> Result<DirectoryInfo> {
    let mut names = Vec::new();
    for entry in fs::read_dir(products_dir)
        .with_context(|| format!("Failed to list {}", products_dir.display()))?
    {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    for name in &names {
        if let Some((vers, arch)) = parse_products_filename(name) {
            let release = release_for(vers)?;
            let arch: Arch = arch
                .parse()
                .with_context(|| format!("Unrecognized MATLAB product file {}", name))?;
            let info = DirectoryInfo {
                arch: Some(arch),
                version: Some(vers.to_string()),
                release: Some(release),
            };
            debug!(dir = %products_dir.display(), file = %name, ?info, "detected from products");
            return Ok(info);
        }
    }

    Ok(DirectoryInfo::default())
}

/// Extract the first `<version>X.Y` tag from version-info contents.
pub fn parse_version_tag(contents: &str) -> Option<&str> {
    VERSION_TAG_RE
        .captures(contents)
        .and_then(|caps| caps.name("vers"))
        .map(|m| m.as_str())
}

/// Split a products file name into `(version, arch token)`.
pub fn parse_products_filename(name: &str) -> Option<(&str, &str)> {
    let caps = PRODUCTS_FILENAME_RE.captures(name)?;
    Some((caps.name("vers")?.as_str(), caps.name("arch")?.as_str()))
}
