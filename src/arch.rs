//! MATLAB architecture identifiers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::StubError;

/// Parent directories (relative to a MATLAB root) that hold one
/// subdirectory per architecture containing shared libraries.
pub const LIB_SEARCH_PARENT_DIRS: [&str; 2] = ["bin", "sys/os"];

/// A MATLAB platform directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    /// 64-bit Linux, ELF shared objects.
    Glnxa64,
    /// 64-bit Windows, PE DLLs.
    Win64,
}

impl Arch {
    /// Every supported architecture, in detection order.
    pub const ALL: [Arch; 2] = [Arch::Glnxa64, Arch::Win64];

    /// The directory name MATLAB uses for this architecture.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Arch::Glnxa64 => "glnxa64",
            Arch::Win64 => "win64",
        }
    }

    /// Library search directories for a MATLAB root, in scan order.
    pub fn lib_search_dirs(&self, root: &Path) -> Vec<PathBuf> {
        LIB_SEARCH_PARENT_DIRS
            .iter()
            .map(|parent| root.join(parent).join(self.as_str()))
            .collect()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = StubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glnxa64" => Ok(Arch::Glnxa64),
            "win64" => Ok(Arch::Win64),
            _ => Err(StubError::UnsupportedArch(s.to_string())),
        }
    }
}
