// Copyright (C) 2026 by GiGa infosystems

//! Support for `Cargo.toml` projects: the declared [crates.io] dependencies & the versions the
//! lock file resolved them to

use crate::manifest::{DependencyGroup, Ecosystem, Manifest};
use crate::toml_edit::{TomlFile, TomlPathLookup};
use cargo_metadata::{MetadataCommand, Package, PackageId};
use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use indexmap::IndexMap;
use itertools::Itertools;
use semver::Version;
use std::collections::{BTreeMap, HashMap};
use std::iter;
use std::path::Path;
use tinyvec::{ArrayVec, array_vec};
use tracing::debug;

/// The paths in which dependencies can be listed in a given manifest
fn dependency_toml_paths(
    manifest: &TomlFile,
) -> Result<impl Iterator<Item = ArrayVec<[&str; 3]>>> {
    let targets = manifest
        .document()
        .as_table()
        .get("target")
        .map(|target| {
            target
                .as_table_like()
                .ok_or_else(|| eyre!("Invalid target table in {:?} at `target`", manifest.path()))
        })
        .transpose()?
        .into_iter()
        .flat_map(|target| target.iter().map(|(key, _)| key));

    let dep_paths = iter::once(None)
        .chain(targets.map(Some))
        .cartesian_product(["dependencies", "build-dependencies", "dev-dependencies"])
        .map(|(target, dep_kind)| {
            target.map_or(
                array_vec!(_ => dep_kind),
                |target| array_vec!(_ => "target", target, dep_kind),
            )
        })
        .chain(iter::once(array_vec!(_ => "workspace", "dependencies")));

    Ok(dep_paths)
}

/// The group for a dependency in the table at `dep_path`
fn group_of(dep_path: &[&str], optional: bool) -> DependencyGroup {
    match dep_path.last() {
        _ if optional => DependencyGroup::Optional,
        Some(&"build-dependencies" | &"dev-dependencies") => DependencyGroup::Develop,
        _ => DependencyGroup::Production,
    }
}

/// Collect the [crates.io] dependencies from a `Cargo.toml`.
///
/// Dependencies from `path`, `git` or alternative registries and ones without a version
/// (including ones inherited from the workspace) are skipped. Renamed dependencies are listed by
/// their package name.
pub fn collect_dependencies(manifest: &TomlFile) -> Result<Manifest> {
    let mut production = IndexMap::new();
    let mut develop = IndexMap::new();
    let mut optional = IndexMap::new();

    for dep_path in dependency_toml_paths(manifest)? {
        let Some(dependencies) = manifest.path_lookup(dep_path) else {
            continue;
        };

        let dependencies = dependencies.as_table_like().ok_or_else(|| {
            eyre!(
                "Invalid dependency table in {:?} at {dep_path}",
                manifest.path()
            )
        })?;

        for (name, dependency) in dependencies.iter() {
            let (package, version, is_optional) =
                if let Some(dependency) = dependency.as_table_like() {
                    let package = match dependency.get("package") {
                        None => name,
                        Some(package) => package.as_str().ok_or_else(|| {
                            eyre!(
                                "Invalid `package` value in {:?} at {dep_path}.{name:?}",
                                manifest.path()
                            )
                        })?,
                    };

                    if dependency.contains_key("registry")
                        || dependency.contains_key("git")
                        || dependency.contains_key("path")
                    {
                        continue;
                    }

                    let Some(version) = dependency.get("version") else {
                        continue;
                    };

                    let is_optional = dependency
                        .get("optional")
                        .and_then(|optional| optional.as_bool())
                        .unwrap_or(false);

                    (package, version, is_optional)
                } else {
                    (name, dependency, false)
                };

            let version = version.as_str().ok_or_else(|| {
                eyre!(
                    "Invalid `version`/immediate value in {:?} at {dep_path}.{name:?}",
                    manifest.path()
                )
            })?;

            let group = match group_of(&dep_path, is_optional) {
                DependencyGroup::Production => &mut production,
                DependencyGroup::Develop => &mut develop,
                DependencyGroup::Optional => &mut optional,
            };
            group
                .entry(package.to_owned())
                .or_insert_with(|| version.to_owned());
        }
    }

    Ok(Manifest {
        path: manifest.path().to_owned(),
        ecosystem: Ecosystem::Cargo,
        production,
        develop,
        optional,
    })
}

/// Read the [crates.io] dependencies from the `Cargo.toml` at `path`
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    collect_dependencies(&TomlFile::open(path)?)
}

/// The resolved versions of the direct [crates.io] dependencies of all workspace members
#[derive(Debug, Default)]
pub struct InstalledCrates {
    versions: BTreeMap<String, Version>,
}

impl InstalledCrates {
    /// Run `cargo metadata` for the `Cargo.toml` at `path`, without updating the lock file.
    ///
    /// If a crate is resolved to multiple versions across workspace members, the version of the
    /// first member is used.
    pub fn gather(path: &Path) -> Result<Self> {
        debug!("Gathering resolved crate versions for {path:?}");

        let data = MetadataCommand::new()
            .manifest_path(path)
            .other_options(vec!["--locked".to_owned()])
            .exec()
            .wrap_err_with(|| format!("Failed to run `cargo metadata` for {path:?}"))?;

        let packages = data
            .packages
            .into_iter()
            .map(|pkg| (pkg.id.clone(), pkg))
            .collect::<HashMap<PackageId, Package>>();

        let mut versions = BTreeMap::new();
        let Some(resolve) = data.resolve else {
            return Ok(InstalledCrates { versions });
        };

        let members = resolve
            .nodes
            .iter()
            .filter(|node| data.workspace_members.contains(&node.id));

        for node in members {
            for dep in &node.deps {
                let Some(package) = packages.get(&dep.pkg) else {
                    continue;
                };

                // NOTE: Local dependencies have no source
                if package.source.is_none() {
                    continue;
                }

                versions
                    .entry(package.name.to_string())
                    .or_insert_with(|| package.version.clone());
            }
        }

        Ok(InstalledCrates { versions })
    }

    /// The resolved version of a direct dependency
    pub fn version_of(&self, name: &str) -> Option<&Version> {
        self.versions.get(name)
    }
}
