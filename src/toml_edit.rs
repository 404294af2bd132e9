// Copyright (C) 2026 by GiGa infosystems

//! Utilities for reading `Cargo.toml` manifests

use color_eyre::{Result, eyre::WrapErr};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item};

/// A parsed TOML file, remembering where it was read from for error reporting
pub struct TomlFile {
    path: PathBuf,
    document: DocumentMut,
}

impl TomlFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents =
            fs::read_to_string(&path).wrap_err_with(|| format!("Could not read {path:?}"))?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        let document = contents
            .parse::<DocumentMut>()
            .wrap_err_with(|| format!("Invalid TOML in {path:?}"))?;
        Ok(TomlFile { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &DocumentMut {
        &self.document
    }
}

/// Utility to follow paths of string keys in a TOML file.
///
/// This is used to access dependency tables & their version requirements.
pub trait TomlPathLookup {
    fn path_lookup(&self, path: impl IntoIterator<Item: AsRef<str>>) -> Option<&Item>;
}

impl TomlPathLookup for Item {
    fn path_lookup(&self, path: impl IntoIterator<Item: AsRef<str>>) -> Option<&Item> {
        let mut item = self;
        for i in path {
            item = item.get(i.as_ref())?;
        }

        Some(item)
    }
}

impl TomlPathLookup for TomlFile {
    fn path_lookup(&self, path: impl IntoIterator<Item: AsRef<str>>) -> Option<&Item> {
        self.document().as_item().path_lookup(path)
    }
}
