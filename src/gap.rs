// Copyright (C) 2026 by GiGa infosystems

//! Classify how far an installed version lags behind the latest release, see [`analyze`].
//!
//! The gap is measured in _missed upgrade opportunities_ over the release history between the two
//! versions, not in raw version distance:
//! * every release sharing the installed major & minor version but with a different patch version
//!   is a missed patch,
//! * every new minor version within the installed major version is a missed minor,
//! * every new major version above the installed one is a missed major.

use semver::Version;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which of the two versions given to [`analyze`] could not be located
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Installed,
    Latest,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Installed => write!(f, "installed"),
            Marker::Latest => write!(f, "latest"),
        }
    }
}

/// The installed or latest version is not part of the release history of a module
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("Could not find the {marker} version `{version}` within the version history of `{module}`")]
pub struct VersionNotFound {
    pub module: String,
    pub marker: Marker,
    pub version: String,
}

/// The missed releases of a single module
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct GapReport {
    pub module_name: String,
    pub installed_version: String,
    pub latest_version: String,
    pub missed_majors: u64,
    pub missed_minors: u64,
    pub missed_patches: u64,
    /// The full release history the gap was computed from, as given to [`analyze`]
    pub versions: Vec<String>,
}

impl GapReport {
    /// Returns `true` if no release was missed in any category
    pub fn is_up_to_date(&self) -> bool {
        self.missed_majors == 0 && self.missed_minors == 0 && self.missed_patches == 0
    }
}

/// Parse a version the way registries print them: surrounding whitespace and a single leading `v`
/// are accepted.
fn parse_lenient(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(version).ok()
}

/// A stable release consists only of digits & dots, so neither pre-release nor build metadata
fn is_stable_release(version: &str) -> bool {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn find_marker(
    module_name: &str,
    versions: &[String],
    version: &str,
    marker: Marker,
) -> Result<usize, VersionNotFound> {
    versions
        .iter()
        .position(|i| i == version)
        .ok_or_else(|| VersionNotFound {
            module: module_name.to_owned(),
            marker,
            version: version.to_owned(),
        })
}

/// Count the missed majors, minors & patches between `installed_version` and `latest_version`.
///
/// `versions` is the release history in the order the registry published it. Both versions are
/// located by the first exact string match, and the history between them (inclusive) is walked in
/// order:
/// * A version sharing the installed major & minor with a different patch counts as a missed
///   patch, every time it is visited.
/// * A version sharing the installed major with a different minor counts as a missed minor, unless
///   the previously counted minor has the same value.
/// * A version with a higher major counts as a missed major, unless the previously counted major
///   has the same value.
///
/// Versions that don't parse are skipped. If the installed version is not a stable release, no
/// releases are counted at all. If the installed version comes after the latest version in the
/// history, nothing is counted either.
pub fn analyze(
    module_name: &str,
    installed_version: &str,
    latest_version: &str,
    versions: Vec<String>,
) -> Result<GapReport, VersionNotFound> {
    let installed_idx = find_marker(module_name, &versions, installed_version, Marker::Installed)?;
    let latest_idx = find_marker(module_name, &versions, latest_version, Marker::Latest)?;

    let mut missed_majors = 0;
    let mut missed_minors = 0;
    let mut missed_patches = 0;

    let installed = parse_lenient(installed_version)
        .filter(|_| is_stable_release(installed_version));

    if let Some(installed) = installed {
        let mut last_major = None;
        let mut last_minor = None;

        let visited = versions.get(installed_idx..=latest_idx).unwrap_or_default();
        for available in visited.iter().filter_map(|i| parse_lenient(i)) {
            if available.major == installed.major
                && available.minor == installed.minor
                && available.patch != installed.patch
            {
                missed_patches += 1;
            }

            if available.major == installed.major
                && available.minor != installed.minor
                && last_minor != Some(available.minor)
            {
                missed_minors += 1;
                last_minor = Some(available.minor);
            }

            if available.major > installed.major && last_major != Some(available.major) {
                missed_majors += 1;
                last_major = Some(available.major);
            }
        }
    }

    Ok(GapReport {
        module_name: module_name.to_owned(),
        installed_version: installed_version.to_owned(),
        latest_version: latest_version.to_owned(),
        missed_majors,
        missed_minors,
        missed_patches,
        versions,
    })
}
