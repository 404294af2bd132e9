// Copyright (C) 2026 by GiGa infosystems

//! `update-gaps` is an application that checks how far the installed dependencies of a project lag
//! behind their latest releases, counted in missed major, minor & patch releases.
//!
//! The order of operations is:
//! * Load the [`config::Options`] & read the [`manifest::Manifest`]
//! * Resolve the installed version, the latest version & the release history of each dependency
//!   with a [`registry::Registry`]
//! * Count the missed releases with [`gap::analyze`]
//! * Decide each category against the module's [`config::Policy`] with [`policy::Decisions`]
//! * Print the [`table`] & write the XML & JSON documents with [`report::write_documents`]
//!
//! Currently, `package.json` manifests are resolved using the `npm` CLI and `Cargo.toml` manifests
//! using the lock file & [crates.io]. Only [crates.io] dependencies of a `Cargo.toml` are checked.
//!
//! [crates.io]: https://crates.io

mod cmd;

pub mod cargo;
pub mod config;
pub mod gap;
pub mod manifest;
pub mod policy;
pub mod registry;
pub mod report;
pub mod runner;
pub mod table;
pub mod template;
pub mod toml_edit;
