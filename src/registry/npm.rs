// Copyright (C) 2026 by GiGa infosystems

//! Resolve packages of a `package.json` project using the `npm` CLI

use super::{Registry, RegistryError, ResolvedModule};
use crate::cmd::cmd;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;

/// Output of `npm ls --json`
#[derive(Debug, Deserialize)]
struct NpmList {
    #[serde(default)]
    dependencies: HashMap<String, NpmListEntry>,
}

#[derive(Debug, Deserialize)]
struct NpmListEntry {
    version: Option<String>,
}

/// Output of `npm view <package> versions --json`, which is a plain string if only a single version
/// was ever published
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmVersions {
    Single(String),
    Multiple(Vec<String>),
}

/// Output of `npm view <package> dist-tags --json`
#[derive(Debug, Deserialize)]
struct NpmDistTags {
    latest: Option<String>,
}

fn parse<T: DeserializeOwned>(package: &str, output: &str) -> Result<T, RegistryError> {
    serde_json::from_str(output).map_err(|source| RegistryError::InvalidResponse {
        package: package.to_owned(),
        source,
    })
}

/// Parse the installed version of `package` from the output of `npm ls --depth=0 --json`
pub fn parse_installed(package: &str, output: &str) -> Result<String, RegistryError> {
    let list: NpmList = parse(package, output)?;
    list.dependencies
        .get(package)
        .and_then(|entry| entry.version.clone())
        .ok_or_else(|| RegistryError::NotInstalled(package.to_owned()))
}

/// Parse the release history from the output of `npm view <package> versions --json`
pub fn parse_versions(package: &str, output: &str) -> Result<Vec<String>, RegistryError> {
    let versions = match parse(package, output)? {
        NpmVersions::Single(version) => vec![version],
        NpmVersions::Multiple(versions) => versions,
    };
    Ok(versions)
}

/// Parse the `latest` tag from the output of `npm view <package> dist-tags --json`
pub fn parse_latest(package: &str, output: &str) -> Result<String, RegistryError> {
    let tags: NpmDistTags = parse(package, output)?;
    tags.latest
        .ok_or_else(|| RegistryError::NoLatestVersion(package.to_owned()))
}

/// Resolves packages by running `npm` in the project directory
pub struct NpmRegistry {
    project_dir: Option<PathBuf>,
}

impl NpmRegistry {
    /// `project_dir` is the directory containing the `package.json`, or `None` for the current
    /// working directory
    pub fn new(project_dir: Option<PathBuf>) -> Self {
        NpmRegistry { project_dir }
    }
}

impl Registry for NpmRegistry {
    fn resolve_module(&self, name: &str) -> Result<ResolvedModule, RegistryError> {
        // NOTE: `npm ls` exits with an error for any problem in the tree, even unrelated ones,
        // while still listing the installed version
        let list = cmd!([npm ls] ["--depth=0" "--json" (name)] -> Output in &self.project_dir)?;
        let installed = parse_installed(name, &String::from_utf8_lossy(&list.stdout))?;

        let versions = cmd!([npm view] [(name) versions "--json"] -> String in &self.project_dir)?;
        let versions = parse_versions(name, &versions)?;

        let tags = cmd!([npm view] [(name) "dist-tags" "--json"] -> String in &self.project_dir)?;
        let latest = parse_latest(name, &tags)?;

        Ok(ResolvedModule {
            name: name.to_owned(),
            installed,
            latest,
            versions,
        })
    }
}
