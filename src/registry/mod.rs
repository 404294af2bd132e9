// Copyright (C) 2026 by GiGa infosystems

//! Look up the installed version, the latest version & the release history of packages, see
//! [`Registry`]

use crate::cargo::InstalledCrates;
use crate::cmd::CommandError;
use crate::manifest::{Ecosystem, Manifest};
use crates_io_api::SyncClient;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod crates_io;
pub mod npm;

/// The version data of a single package, as needed by [`crate::gap::analyze`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolvedModule {
    pub name: String,
    pub installed: String,
    pub latest: String,
    /// All published versions, oldest first
    pub versions: Vec<String>,
}

/// A failure to resolve a single package.
///
/// These never abort a check, the package is skipped instead.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Package `{0}` not found in the registry")]
    NotFound(String),

    #[error("Package `{0}` is not installed")]
    NotInstalled(String),

    #[error("Package `{0}` has no latest version")]
    NoLatestVersion(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Registry API error: {0}")]
    Api(#[from] crates_io_api::Error),

    #[error("Invalid registry response for `{package}`: {source}")]
    InvalidResponse {
        package: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A source of version data for packages
pub trait Registry {
    /// Resolve the installed version, the latest version & the release history of `name`
    fn resolve_module(&self, name: &str) -> Result<ResolvedModule, RegistryError>;
}

impl<R: Registry + ?Sized> Registry for Box<R> {
    fn resolve_module(&self, name: &str) -> Result<ResolvedModule, RegistryError> {
        (**self).resolve_module(name)
    }
}

/// The registry matching the ecosystem of `manifest`
pub fn for_manifest(manifest: &Manifest) -> color_eyre::Result<Box<dyn Registry>> {
    debug!("Using the {:?} registry", manifest.ecosystem);
    match manifest.ecosystem {
        Ecosystem::Npm => Ok(Box::new(npm::NpmRegistry::new(manifest.project_dir()))),
        Ecosystem::Cargo => {
            let installed = InstalledCrates::gather(&manifest.path)?;
            let client = SyncClient::new(
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
                Duration::from_millis(1000),
            )?;
            Ok(Box::new(crates_io::CratesIoRegistry::new(client, installed)))
        }
    }
}
