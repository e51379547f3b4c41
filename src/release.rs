//! Numeric MATLAB version to release label lookup.

use anyhow::Result;

use crate::error::StubError;

const VERSION_RELEASES: &[(&str, &str)] = &[
    ("8.0", "r2012b"),
    ("8.1", "r2013a"),
    ("8.2", "r2013b"),
    ("8.3", "r2014a"),
    ("8.4", "r2014b"),
    ("8.5", "r2015a"),
    ("8.6", "r2015b"),
    ("9.0", "r2016a"),
    ("9.1", "r2016b"),
    ("9.2", "r2017a"),
    ("9.3", "r2017b"),
    ("9.4", "r2018a"),
    ("9.5", "r2018b"),
    ("9.6", "r2019a"),
    ("9.7", "r2019b"),
    ("9.8", "r2020a"),
    ("9.9", "r2020b"),
    ("9.10", "r2021a"),
    ("9.11", "r2021b"),
    ("9.12", "r2022a"),
    ("9.13", "r2022b"),
    ("9.14", "r2023a"),
    ("23.2", "r2023b"),
    ("24.1", "r2024a"),
    ("24.2", "r2024b"),
    ("25.1", "r2025a"),
];

/// Look up the release label (e.g. `r2018b`) for a version string (e.g. `9.5`).
///
/// There is no fallback: an unknown version is a [`StubError::UnknownVersion`].
pub fn release_for(version: &str) -> Result<&'static str> {
    VERSION_RELEASES
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, release)| *release)
        .ok_or_else(|| {
            StubError::UnknownVersion {
                version: version.to_string(),
            }
            .into()
        })
}
