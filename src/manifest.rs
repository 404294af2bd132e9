// Copyright (C) 2026 by GiGa infosystems

//! Read the declared dependencies of a project from its manifest (`package.json` or
//! `Cargo.toml`), see [`Manifest`]

use crate::cargo;
use crate::config::IncludeOptions;
use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The package ecosystem a manifest belongs to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ecosystem {
    /// `package.json`, resolved using the `npm` CLI
    Npm,
    /// `Cargo.toml`, resolved using `cargo metadata` & [crates.io]
    Cargo,
}

impl Ecosystem {
    /// `Cargo.toml` files are [`Ecosystem::Cargo`] manifests, everything else is assumed to be a
    /// `package.json`
    pub fn of_manifest(path: &Path) -> Self {
        if path.file_name() == Some("Cargo.toml".as_ref()) {
            Ecosystem::Cargo
        } else {
            Ecosystem::Npm
        }
    }
}

/// The group a dependency is declared in
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DependencyGroup {
    Production,
    Develop,
    Optional,
}

impl fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyGroup::Production => write!(f, "production"),
            DependencyGroup::Develop => write!(f, "develop"),
            DependencyGroup::Optional => write!(f, "optional"),
        }
    }
}

/// A dependency selected for checking
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dependency {
    pub name: String,
    /// The declared version range, as written in the manifest
    pub requirement: String,
    pub group: DependencyGroup,
}

/// The dependencies declared in a manifest, in declaration order
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Manifest {
    pub path: PathBuf,
    pub ecosystem: Ecosystem,
    pub production: IndexMap<String, String>,
    pub develop: IndexMap<String, String>,
    pub optional: IndexMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: IndexMap<String, String>,
    #[serde(default)]
    dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    optional_dependencies: IndexMap<String, String>,
}

impl Manifest {
    /// Read the manifest at `path`.
    ///
    /// A missing or invalid manifest is an error, as nothing can be checked without it.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("Could not read the manifest {path:?}, the file doesn't exist");
        }

        match Ecosystem::of_manifest(path) {
            Ecosystem::Npm => {
                let contents = fs::read_to_string(path)
                    .wrap_err_with(|| format!("Could not read the manifest {path:?}"))?;
                Self::from_package_json(path, &contents)
                    .wrap_err_with(|| format!("Invalid manifest {path:?}"))
            }
            Ecosystem::Cargo => cargo::read_manifest(path),
        }
    }

    /// Parse the contents of a `package.json` located at `path`
    pub fn from_package_json(path: &Path, contents: &str) -> Result<Self> {
        let package: PackageJson = serde_json::from_str(contents)?;
        Ok(Manifest {
            path: path.to_owned(),
            ecosystem: Ecosystem::Npm,
            production: package.dependencies,
            develop: package.dev_dependencies,
            optional: package.optional_dependencies,
        })
    }

    /// The directory containing the manifest, or `None` if that is the current working directory
    pub fn project_dir(&self) -> Option<PathBuf> {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_owned)
    }

    /// The dependencies of the groups enabled in `include`.
    ///
    /// Groups are merged in the order production, develop, optional. A dependency declared in
    /// multiple groups is only returned once, at the position of its first declaration, with the
    /// group & requirement of its last declaration.
    pub fn dependencies(&self, include: &IncludeOptions) -> Vec<Dependency> {
        let groups = [
            (include.production, DependencyGroup::Production, &self.production),
            (include.develop, DependencyGroup::Develop, &self.develop),
            (include.optional, DependencyGroup::Optional, &self.optional),
        ];

        let mut merged = IndexMap::new();
        for (_, group, dependencies) in groups.into_iter().filter(|(enabled, ..)| *enabled) {
            for (name, requirement) in dependencies {
                merged.insert(name, (group, requirement));
            }
        }

        merged
            .into_iter()
            .map(|(name, (group, requirement))| Dependency {
                name: name.clone(),
                requirement: requirement.clone(),
                group,
            })
            .collect()
    }
}
