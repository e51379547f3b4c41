//! Typed failures that callers may want to match on.
//!
//! Everything else travels as a plain `anyhow::Error` with context attached.
//! These variants are wrapped in `anyhow::Error` too and can be recovered
//! with `downcast_ref::<StubError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    /// The version string has no entry in the release map.
    #[error("unknown MATLAB version: {version} (no release label known)")]
    UnknownVersion { version: String },

    /// An architecture name outside the supported set.
    #[error("unsupported architecture: {0}")]
    UnsupportedArch(String),

    /// An external tool could not be started.
    #[error("{tool} command not found - install binutils/tar")]
    ToolMissing { tool: &'static str },

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} failed on {}: {stderr}", path.display())]
    ToolFailed {
        tool: &'static str,
        path: PathBuf,
        stderr: String,
    },
}
