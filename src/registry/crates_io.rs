// Copyright (C) 2026 by GiGa infosystems

//! Resolve packages of a `Cargo.toml` project using the lock file & [crates.io]

use super::{Registry, RegistryError, ResolvedModule};
use crate::cargo::InstalledCrates;
use crates_io_api::SyncClient;
use semver::Version;

/// A published version of a crate
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PublishedVersion {
    pub version: Version,
    pub yanked: bool,
}

/// Fetch all published versions of a crate, including yanked ones.
///
/// Versions that are not valid `semver` versions are skipped.
pub fn fetch_versions_for(
    client: &SyncClient,
    package: &str,
) -> Result<Vec<PublishedVersion>, RegistryError> {
    let info = match client.get_crate(package) {
        Ok(info) => info,
        Err(crates_io_api::Error::NotFound(_)) => {
            return Err(RegistryError::NotFound(package.to_owned()));
        }
        Err(err) => return Err(err.into()),
    };

    let versions = info
        .versions
        .into_iter()
        .filter_map(|version| {
            let parsed = version.num.parse::<Version>().ok()?;
            Some(PublishedVersion {
                version: parsed,
                yanked: version.yanked,
            })
        })
        .collect();
    Ok(versions)
}

/// Build the version data of a crate from its published versions.
///
/// The history is sorted oldest first, and the latest version is the newest version that is
/// neither yanked nor a pre-release.
pub fn resolve_from_published(
    name: &str,
    installed: &Version,
    mut published: Vec<PublishedVersion>,
) -> Result<ResolvedModule, RegistryError> {
    published.sort_by(|a, b| a.version.cmp(&b.version));

    let latest = published
        .iter()
        .rev()
        .find(|i| !i.yanked && i.version.pre.is_empty())
        .ok_or_else(|| RegistryError::NoLatestVersion(name.to_owned()))?
        .version
        .to_string();

    Ok(ResolvedModule {
        name: name.to_owned(),
        installed: installed.to_string(),
        latest,
        versions: published
            .into_iter()
            .map(|i| i.version.to_string())
            .collect(),
    })
}

/// Resolves crates using the versions from the lock file and the version history from [crates.io]
pub struct CratesIoRegistry {
    client: SyncClient,
    installed: InstalledCrates,
}

impl CratesIoRegistry {
    pub fn new(client: SyncClient, installed: InstalledCrates) -> Self {
        CratesIoRegistry { client, installed }
    }
}

impl Registry for CratesIoRegistry {
    fn resolve_module(&self, name: &str) -> Result<ResolvedModule, RegistryError> {
        let installed = self
            .installed
            .version_of(name)
            .ok_or_else(|| RegistryError::NotInstalled(name.to_owned()))?;
        let published = fetch_versions_for(&self.client, name)?;
        resolve_from_published(name, installed, published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn published(version: &str, yanked: bool) -> PublishedVersion {
        PublishedVersion {
            version: version.parse().unwrap(),
            yanked,
        }
    }

    #[test]
    fn sorts_history_and_skips_yanked_and_prereleases_for_latest() {
        // crates.io lists the newest version first
        let versions = vec![
            published("2.0.0-rc.1", false),
            published("1.2.0", true),
            published("1.1.0", false),
            published("1.0.0", false),
        ];
        let resolved = resolve_from_published("dummy", &Version::new(1, 0, 0), versions).unwrap();

        assert_eq!(
            resolved,
            ResolvedModule {
                name: "dummy".to_owned(),
                installed: "1.0.0".to_owned(),
                latest: "1.1.0".to_owned(),
                versions: vec![
                    "1.0.0".to_owned(),
                    "1.1.0".to_owned(),
                    "1.2.0".to_owned(),
                    "2.0.0-rc.1".to_owned(),
                ],
            }
        );
    }

    #[test]
    fn yanked_installed_version_stays_in_history() {
        let versions = vec![published("1.0.1", false), published("1.0.0", true)];
        let resolved = resolve_from_published("dummy", &Version::new(1, 0, 0), versions).unwrap();
        assert_eq!(resolved.versions, ["1.0.0", "1.0.1"]);
        assert_eq!(resolved.latest, "1.0.1");
    }

    #[test]
    fn no_stable_version_is_an_error() {
        let versions = vec![published("0.1.0-alpha", false), published("0.1.0", true)];
        let result = resolve_from_published("dummy", &Version::new(0, 1, 0), versions);
        assert!(matches!(result, Err(RegistryError::NoLatestVersion(_))));
    }

    #[test]
    fn uninstalled_crate_is_an_error() {
        let client = SyncClient::new(
            "update-gaps tests",
            std::time::Duration::from_millis(1000),
        )
        .unwrap();
        let registry = CratesIoRegistry::new(client, InstalledCrates::default());
        // Fails before any request is made
        assert!(matches!(
            registry.resolve_module("serde"),
            Err(RegistryError::NotInstalled(_))
        ));
    }
}
