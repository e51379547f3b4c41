//! Shared-library dependency extraction using binutils.
//!
//! ELF objects (glnxa64) are read with `readelf -d`, PE DLLs (win64) with
//! `objdump -p`. Neither tool executes the library, so this works for
//! foreign architectures as long as binutils understands the format.

use anyhow::{bail, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};

use crate::arch::Arch;
use crate::error::StubError;

/// Source of direct dependency names for a library file.
pub trait Inspector {
    /// Names (not paths) of the libraries `lib_path` links against directly.
    fn direct_dependencies(&self, arch: Arch, lib_path: &Path) -> Result<Vec<String>>;
}

/// [`Inspector`] backed by the `readelf` and `objdump` command-line tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolInspector;

impl Inspector for ToolInspector {
    fn direct_dependencies(&self, arch: Arch, lib_path: &Path) -> Result<Vec<String>> {
        match arch {
            Arch::Glnxa64 => get_library_dependencies(lib_path),
            Arch::Win64 => get_dll_dependencies(lib_path),
        }
    }
}

/// Extract NEEDED entries from an ELF file using readelf.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - `readelf` is not installed (install binutils)
/// - `readelf` fails for reasons other than "not an ELF file"
///
/// Returns `Ok(Vec::new())` if the file is not an ELF binary (e.g., a text file).
#[must_use = "library dependencies should be processed"]
pub fn get_library_dependencies(lib_path: &Path) -> Result<Vec<String>> {
    let output = run_tool("readelf", &["-d"], lib_path)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // These are legitimate "not an ELF" cases, not errors
        if stderr.contains("Not an ELF file")
            || stderr.contains("not a dynamic executable")
            || stderr.contains("File format not recognized")
        {
            return Ok(Vec::new());
        }
        return Err(tool_failed("readelf", lib_path, &stderr));
    }

    Ok(parse_readelf_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Extract imported DLL names from a PE file using objdump.
///
/// # Errors
///
/// Fails if the file does not exist, `objdump` is missing, or `objdump`
/// exits unsuccessfully.
#[must_use = "library dependencies should be processed"]
pub fn get_dll_dependencies(lib_path: &Path) -> Result<Vec<String>> {
    let output = run_tool("objdump", &["-p"], lib_path)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tool_failed("objdump", lib_path, &stderr));
    }

    Ok(parse_objdump_output(&String::from_utf8_lossy(&output.stdout)))
}

fn run_tool(tool: &'static str, args: &[&str], path: &Path) -> Result<Output> {
    // Check file exists first for a clear error message
    if !path.exists() {
        bail!("File does not exist: {}", path.display());
    }

    Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => StubError::ToolMissing { tool }.into(),
            _ => anyhow::Error::new(e).context(format!("Failed to run {tool}")),
        })
}

fn tool_failed(tool: &'static str, path: &Path, stderr: &str) -> anyhow::Error {
    StubError::ToolFailed {
        tool,
        path: path.to_path_buf(),
        stderr: stderr.trim().to_string(),
    }
    .into()
}

/// Parse readelf -d output to extract NEEDED library names.
///
/// Example readelf output:
/// ```text
/// Dynamic section at offset 0x2d0e0 contains 28 entries:
///   Tag        Type                         Name/Value
///  0x0000000000000001 (NEEDED)             Shared library: [libmx.so]
///  0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
/// ```
///
/// llvm-readelf prints the tag without parentheses; both forms are accepted.
pub fn parse_readelf_output(output: &str) -> Vec<String> {
    let mut libs = Vec::new();

    for line in output.lines() {
        let is_needed = line
            .split_whitespace()
            .any(|tok| tok.trim_start_matches('(').trim_end_matches(')') == "NEEDED");
        if !is_needed {
            continue;
        }
        // Extract library name from ": [libname.so.X]"
        let Some(colon) = line.find(':') else {
            continue;
        };
        let rest = &line[colon + 1..];
        if let (Some(start), Some(end)) = (rest.find('['), rest.rfind(']')) {
            if start < end {
                libs.push(rest[start + 1..end].to_string());
            }
        }
    }

    libs
}

/// Parse objdump -p output to extract imported DLL names.
///
/// Example objdump output:
/// ```text
/// The Import Tables (interpreted .idata section contents)
///  vma:            Hint    Time      Forward  DLL       First
/// 	DLL Name: libmx.dll
/// 	DLL Name: KERNEL32.dll
/// ```
pub fn parse_objdump_output(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("DLL Name:")?;
            let name = rest.split_whitespace().next()?;
            is_dll_name(name).then(|| name.to_string())
        })
        .collect()
}

fn is_dll_name(name: &str) -> bool {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'));
    let lower = name.to_ascii_lowercase();
    valid_chars && lower.len() > 4 && lower.ends_with(".dll")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_readelf_output() {
        let output = r#"
Dynamic section at offset 0x2d0e0 contains 28 entries:
  Tag        Type                         Name/Value
 0x0000000000000001 (NEEDED)             Shared library: [libmwfl.so]
 0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
 0x000000000000000e (SONAME)             Library soname: [libmx.so]
 0x000000000000000c (INIT)               0x5000
"#;
        let libs = parse_readelf_output(output);
        assert_eq!(libs, vec!["libmwfl.so", "libc.so.6"]);
    }

    #[test]
    fn test_parse_llvm_readelf_output() {
        let output = "  0x0000000000000001 NEEDED               Shared library: [libmwi18n.so]\n";
        assert_eq!(parse_readelf_output(output), vec!["libmwi18n.so"]);
    }

    #[test]
    fn test_parse_readelf_empty() {
        let output = "not an ELF file";
        let libs = parse_readelf_output(output);
        assert!(libs.is_empty());
    }

    #[test]
    fn test_parse_objdump_output() {
        let output = "\
The Import Tables (interpreted .idata section contents)
 vma:            Hint    Time      Forward  DLL       First
\tDLL Name: libmwfl.dll
\tvma:  Hint/Ord Member-Name Bound-To
\tDLL Name: KERNEL32.DLL
\tDLL Name: api-ms-win-crt-runtime-l1-1-0.dll
\tDLL Name: not-a-library.exe
";
        let libs = parse_objdump_output(output);
        assert_eq!(
            libs,
            vec!["libmwfl.dll", "KERNEL32.DLL", "api-ms-win-crt-runtime-l1-1-0.dll"]
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ToolInspector
            .direct_dependencies(Arch::Win64, Path::new("/nonexistent/libmx.dll"))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
