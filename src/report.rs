// Copyright (C) 2026 by GiGa infosystems

//! The checked modules & writing them as XML & JSON documents

use crate::config::OutputOptions;
use crate::gap::GapReport;
use crate::policy::{Decisions, Status};
use crate::template::Templates;
use color_eyre::{
    Result,
    eyre::{Report, WrapErr},
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// A checked module: its gap & the decisions of its policy
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleOutcome {
    pub report: GapReport,
    pub decisions: Decisions,
    /// Show the release history in the console table
    pub show_versions: bool,
}

impl ModuleOutcome {
    pub fn status(&self) -> Status {
        self.decisions.status()
    }
}

/// A module as seen by the document templates
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord<'a> {
    pub name: &'a str,
    pub installed: &'a str,
    pub latest: &'a str,
    pub missed_majors: u64,
    pub missed_minors: u64,
    pub missed_patches: u64,
    pub versions: &'a [String],
    pub status: Status,
}

impl<'a> From<&'a ModuleOutcome> for ModuleRecord<'a> {
    fn from(outcome: &'a ModuleOutcome) -> Self {
        let report = &outcome.report;
        ModuleRecord {
            name: &report.module_name,
            installed: &report.installed_version,
            latest: &report.latest_version,
            missed_majors: report.missed_majors,
            missed_minors: report.missed_minors,
            missed_patches: report.missed_patches,
            versions: &report.versions,
            status: outcome.status(),
        }
    }
}

/// The context of the document templates
#[derive(Serialize)]
pub struct ReportContext<'a> {
    pub modules: Vec<ModuleRecord<'a>>,
}

impl<'a> ReportContext<'a> {
    pub fn new(outcomes: &'a [ModuleOutcome]) -> Self {
        ReportContext {
            modules: outcomes.iter().map(ModuleRecord::from).collect(),
        }
    }
}

fn write_document(path: &Path, render: impl FnOnce() -> Result<String>) -> Result<()> {
    let contents = render().wrap_err_with(|| format!("Could not render {path:?}"))?;
    fs::write(path, contents).wrap_err_with(|| format!("Could not write {path:?}"))?;
    info!("Wrote {path:?}");
    Ok(())
}

/// Write the documents enabled in `output`.
///
/// A document that can't be rendered or written doesn't stop the others, the failures are logged
/// & returned.
pub fn write_documents(
    outcomes: &[ModuleOutcome],
    output: &OutputOptions,
    templates: &Templates,
) -> Vec<Report> {
    let ctx = ReportContext::new(outcomes);

    let mut failures = Vec::new();
    let mut record = |result: Result<()>| {
        if let Err(err) = result {
            warn!("{err:#}");
            failures.push(err);
        }
    };

    if output.xml {
        record(write_document(&output.xml_filename, || {
            templates.render_xml(&ctx)
        }));
    }
    if output.json {
        record(write_document(&output.json_filename, || {
            templates.render_json(&ctx)
        }));
    }
    failures
}
