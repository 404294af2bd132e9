// Copyright (C) 2026 by GiGa infosystems

//! Check every dependency of a manifest, see [`Runner`]

use crate::config::Options;
use crate::gap::{self, VersionNotFound};
use crate::manifest::Dependency;
use crate::policy::{Decisions, Status};
use crate::registry::{Registry, RegistryError};
use crate::report::ModuleOutcome;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Why a single module couldn't be checked
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    VersionNotFound(#[from] VersionNotFound),
}

/// The result of checking all dependencies
#[derive(Debug, Default)]
pub struct Summary {
    /// The checked modules, in the order of the manifest
    pub outcomes: Vec<ModuleOutcome>,
    /// The modules that couldn't be checked
    pub skipped: Vec<String>,
}

impl Summary {
    /// The number of failed modules
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status() == Status::Fail)
            .count()
    }
}

/// A progress bar counting the checked modules
pub fn progress_bar(len: usize) -> Result<ProgressBar> {
    let progress = ProgressBar::new(len as u64);
    progress.set_style(ProgressStyle::with_template(
        "Checking update states for module {pos}/{len} [{wide_bar}] {percent}% {elapsed_precise}",
    )?);
    Ok(progress)
}

/// The diagnostic for a dependency that couldn't be checked
fn skip_message(dependency: &Dependency, err: &dyn std::error::Error) -> String {
    format!(
        "Skipping {} dependency `{}` ({}): {err}",
        dependency.group, dependency.name, dependency.requirement
    )
}

/// Checks dependencies against the [`Options`] using a [`Registry`]
pub struct Runner<'a, R> {
    options: &'a Options,
    registry: R,
}

impl<'a, R: Registry> Runner<'a, R> {
    pub fn new(options: &'a Options, registry: R) -> Self {
        Runner { options, registry }
    }

    /// Resolve, analyze & decide a single module
    pub fn check_module(&self, name: &str) -> Result<ModuleOutcome, ModuleError> {
        let resolved = self.registry.resolve_module(name)?;
        debug!(
            "`{}`: installed {}, latest {}, {} published versions",
            resolved.name,
            resolved.installed,
            resolved.latest,
            resolved.versions.len()
        );

        let report = gap::analyze(
            name,
            &resolved.installed,
            &resolved.latest,
            resolved.versions,
        )?;
        if report.is_up_to_date() {
            debug!("`{name}` is up to date");
        }
        let policy = self.options.policy_for(name);

        Ok(ModuleOutcome {
            decisions: Decisions::evaluate(policy, &report),
            show_versions: policy.show_versions,
            report,
        })
    }

    /// Check all `dependencies` in order.
    ///
    /// Modules that can't be checked are logged & skipped, they never count as failures.
    pub fn run(&self, dependencies: &[Dependency], progress: &ProgressBar) -> Summary {
        let mut summary = Summary::default();

        for dependency in dependencies {
            match self.check_module(&dependency.name) {
                Ok(outcome) => summary.outcomes.push(outcome),
                Err(ModuleError::Registry(err)) => {
                    progress.suspend(|| warn!("{}", skip_message(dependency, &err)));
                    summary.skipped.push(dependency.name.clone());
                }
                Err(ModuleError::VersionNotFound(err)) => {
                    progress.suspend(|| error!("{}", skip_message(dependency, &err)));
                    summary.skipped.push(dependency.name.clone());
                }
            }
            progress.inc(1);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DependencyGroup;
    use crate::policy::Decision;
    use crate::registry::ResolvedModule;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Serves fixed version data
    #[derive(Default)]
    struct FakeRegistry {
        modules: HashMap<&'static str, (&'static str, &'static str, Vec<&'static str>)>,
    }

    impl FakeRegistry {
        fn with(
            mut self,
            name: &'static str,
            installed: &'static str,
            latest: &'static str,
            versions: &[&'static str],
        ) -> Self {
            self.modules
                .insert(name, (installed, latest, versions.to_vec()));
            self
        }
    }

    impl Registry for FakeRegistry {
        fn resolve_module(&self, name: &str) -> Result<ResolvedModule, RegistryError> {
            let (installed, latest, versions) = self
                .modules
                .get(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;
            Ok(ResolvedModule {
                name: name.to_owned(),
                installed: installed.to_string(),
                latest: latest.to_string(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
            })
        }
    }

    fn dependencies(names: &[&str]) -> Vec<Dependency> {
        names
            .iter()
            .map(|name| Dependency {
                name: name.to_string(),
                requirement: "*".to_owned(),
                group: DependencyGroup::Production,
            })
            .collect()
    }

    #[test]
    fn checks_modules_in_order_and_skips_unresolvable_ones() {
        let registry = FakeRegistry::default()
            .with("react", "17.0.2", "18.2.0", &["17.0.2", "18.0.0", "18.2.0"])
            .with("lodash", "4.17.21", "4.17.21", &["4.17.20", "4.17.21"])
            .with("broken", "1.0.0", "1.0.1", &["1.0.1"]);
        let options = Options::default();
        let runner = Runner::new(&options, registry);

        let summary = runner.run(
            &dependencies(&["react", "unknown", "lodash", "broken"]),
            &ProgressBar::hidden(),
        );

        let names = summary
            .outcomes
            .iter()
            .map(|outcome| outcome.report.module_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["react", "lodash"]);
        assert_eq!(summary.skipped, ["unknown", "broken"]);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.outcomes[0].status(), Status::Fail);
        assert_eq!(summary.outcomes[1].status(), Status::Success);
    }

    #[test]
    fn module_policy_is_applied() {
        let registry =
            FakeRegistry::default().with("react", "17.0.2", "18.2.0", &["17.0.2", "18.2.0"]);
        let options = Options::from_json(
            r#"{ "modules": { "react": { "missedMajors": { "allowed": true }, "showVersions": true } } }"#,
        )
        .unwrap();
        let runner = Runner::new(&options, registry);

        let outcome = runner.check_module("react").unwrap();
        assert_eq!(outcome.decisions.majors, Decision::Pass);
        assert!(outcome.show_versions);
        assert_eq!(outcome.status(), Status::Success);
    }

    #[test]
    fn missing_installed_version_is_reported() {
        let registry = FakeRegistry::default().with("broken", "1.0.0", "1.0.1", &["1.0.1"]);
        let options = Options::default();
        let runner = Runner::new(&options, registry);

        assert!(matches!(
            runner.check_module("broken"),
            Err(ModuleError::VersionNotFound(_))
        ));
    }

    #[test]
    fn skip_message_names_the_declaration() {
        let dependency = Dependency {
            name: "left-pad".to_owned(),
            requirement: "^1.0.0".to_owned(),
            group: DependencyGroup::Develop,
        };
        let err = RegistryError::NotFound("left-pad".to_owned());
        assert_eq!(
            skip_message(&dependency, &err),
            "Skipping develop dependency `left-pad` (^1.0.0): Package `left-pad` not found in the registry"
        );
    }

    #[test]
    fn progress_bar_template_is_valid() {
        assert_eq!(progress_bar(3).unwrap().length(), Some(3));
    }
}
