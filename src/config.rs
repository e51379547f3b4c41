//! Where candidate MATLAB roots come from when none are given on the command line.

use crate::arch::Arch;

/// Base environment variable names. Each is also consulted with an
/// `_<ARCH>` suffix for every selected architecture.
pub const MATLAB_ROOT_ENV_VARS: [&str; 2] = ["MATLAB_ROOT", "MATLAB_ROOTS"];

/// Every environment variable consulted for `archs`, in lookup order.
pub fn env_var_names(archs: &[Arch]) -> Vec<String> {
    let mut names: Vec<String> = MATLAB_ROOT_ENV_VARS.iter().map(|s| s.to_string()).collect();
    for arch in archs {
        for var in MATLAB_ROOT_ENV_VARS {
            names.push(format!("{var}_{}", arch.as_str().to_ascii_uppercase()));
        }
    }
    names
}

/// Collect candidate roots from environment variables.
///
/// `lookup` returns a variable's value, if set. Values are path lists split on
/// `;` or `:`. Empty pieces are dropped and duplicates removed, keeping the
/// first occurrence.
pub fn roots_from_env<F>(archs: &[Arch], lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut roots: Vec<String> = Vec::new();
    for name in env_var_names(archs) {
        let Some(value) = lookup(&name) else {
            continue;
        };
        for piece in value.split([';', ':']) {
            if !piece.is_empty() && !roots.iter().any(|r| r == piece) {
                roots.push(piece.to_string());
            }
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_var_names() {
        assert_eq!(
            env_var_names(&[Arch::Glnxa64]),
            vec![
                "MATLAB_ROOT",
                "MATLAB_ROOTS",
                "MATLAB_ROOT_GLNXA64",
                "MATLAB_ROOTS_GLNXA64"
            ]
        );
    }

    #[test]
    fn test_roots_from_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MATLAB_ROOT", "/opt/matlab/R2018b"),
            ("MATLAB_ROOTS", "/opt/a;/opt/b:/opt/matlab/R2018b::"),
            ("MATLAB_ROOT_WIN64", "/win/matlab"),
            ("MATLAB_ROOT_GLNXA64", "/ignored/without/arch"),
        ]);
        let roots = roots_from_env(&[Arch::Win64], |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(
            roots,
            vec!["/opt/matlab/R2018b", "/opt/a", "/opt/b", "/win/matlab"]
        );
    }

    #[test]
    fn test_roots_from_empty_env() {
        assert!(roots_from_env(&Arch::ALL, |_| None).is_empty());
    }
}
