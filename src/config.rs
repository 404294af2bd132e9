// Copyright (C) 2026 by GiGa infosystems

//! The options controlling a check, loaded from a JSON file.
//!
//! Every object may be given partially, missing fields take the built-in defaults. A policy given
//! for a single module in `modules` replaces the `global` policy for that module entirely: fields
//! it omits fall back to the built-in defaults, not to the `global` values.

use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The configuration file used if none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "update-gaps.config.json";

/// How many missed releases of a category are tolerated
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Allowed {
    /// Any number of missed releases is fine (`true` in the configuration)
    Always,
    /// At most this many missed releases are fine (`false` is the same as `0`)
    Count(u64),
}

impl Allowed {
    /// Returns `true` if `missed` releases exceed this limit
    pub fn is_exceeded_by(self, missed: u64) -> bool {
        match self {
            Allowed::Always => false,
            Allowed::Count(allowed) => missed > allowed,
        }
    }
}

impl<'de> Deserialize<'de> for Allowed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Count(u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Allowed::Always,
            Repr::Flag(false) => Allowed::Count(0),
            Repr::Count(count) => Allowed::Count(count),
        })
    }
}

/// The severity of exceeding a threshold
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Shown, but the module still passes
    Warn,
    /// The module fails
    Error,
    /// Not shown (unless debugging), the module passes
    #[serde(other)]
    Silent,
}

/// The threshold for a single category of missed releases
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Threshold {
    pub allowed: Allowed,
    pub level: Level,
}

/// The thresholds for all categories, either globally or for a specific module
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(from = "PartialPolicy")]
pub struct Policy {
    pub missed_majors: Threshold,
    pub missed_minors: Threshold,
    pub missed_patches: Threshold,
    /// Show the release history in the console table
    pub show_versions: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            missed_majors: Threshold {
                allowed: Allowed::Count(0),
                level: Level::Error,
            },
            missed_minors: Threshold {
                allowed: Allowed::Count(1),
                level: Level::Warn,
            },
            missed_patches: Threshold {
                allowed: Allowed::Count(0),
                level: Level::Warn,
            },
            show_versions: false,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialThreshold {
    allowed: Option<Allowed>,
    level: Option<Level>,
}

impl PartialThreshold {
    fn or(self, default: Threshold) -> Threshold {
        Threshold {
            allowed: self.allowed.unwrap_or(default.allowed),
            level: self.level.unwrap_or(default.level),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PartialPolicy {
    missed_majors: PartialThreshold,
    missed_minors: PartialThreshold,
    missed_patches: PartialThreshold,
    show_versions: Option<bool>,
}

impl From<PartialPolicy> for Policy {
    fn from(partial: PartialPolicy) -> Self {
        let defaults = Policy::default();
        Policy {
            missed_majors: partial.missed_majors.or(defaults.missed_majors),
            missed_minors: partial.missed_minors.or(defaults.missed_minors),
            missed_patches: partial.missed_patches.or(defaults.missed_patches),
            show_versions: partial.show_versions.unwrap_or(defaults.show_versions),
        }
    }
}

/// Which dependencies of the manifest are checked
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncludeOptions {
    pub production: bool,
    pub develop: bool,
    pub optional: bool,
    /// The manifest to read the dependencies from
    pub json_file: PathBuf,
}

impl Default for IncludeOptions {
    fn default() -> Self {
        IncludeOptions {
            production: true,
            develop: true,
            optional: false,
            json_file: PathBuf::from("package.json"),
        }
    }
}

/// Which outputs are produced
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOptions {
    /// Print the console table even if all modules passed
    pub visual: bool,
    pub xml: bool,
    pub xml_filename: PathBuf,
    /// Inline minijinja source replacing the XML template
    pub xml_template: Option<String>,
    pub json: bool,
    pub json_filename: PathBuf,
    /// Inline minijinja source replacing the JSON output
    pub json_template: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            visual: true,
            xml: true,
            xml_filename: PathBuf::from("update-gaps.xml"),
            xml_template: None,
            json: true,
            json_filename: PathBuf::from("update-gaps.json"),
            json_template: None,
        }
    }
}

/// All options of a check
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    pub include: IncludeOptions,
    pub output: OutputOptions,
    pub global: Policy,
    /// Policies replacing `global` for the named modules
    pub modules: IndexMap<String, Policy>,
}

impl Options {
    /// Parse options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from the given file, or from [`DEFAULT_CONFIG_FILE`] if it exists, or fall back
    /// to the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.is_file() => bail!("Configuration file {path:?} doesn't exist"),
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
            None => {
                debug!("No configuration file found, using the defaults");
                return Ok(Options::default());
            }
        };

        debug!("Loading configuration from {path:?}");
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read configuration file {path:?}"))?;
        Self::from_json(&contents)
            .wrap_err_with(|| format!("Invalid configuration file {path:?}"))
    }

    /// The policy in effect for a module: its own if configured, the global one otherwise
    pub fn policy_for(&self, module: &str) -> &Policy {
        self.modules.get(module).unwrap_or(&self.global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
    }

    #[test]
    fn partial_objects_keep_the_remaining_defaults() {
        let options = Options::from_json(indoc! {r#"
            {
                "include": { "optional": true },
                "output": { "json": false },
                "global": { "missedMinors": { "level": "error" } }
            }
        "#})
        .unwrap();

        assert!(options.include.production);
        assert!(options.include.optional);
        assert_eq!(options.include.json_file, PathBuf::from("package.json"));
        assert!(!options.output.json);
        assert!(options.output.xml);
        assert_eq!(
            options.global.missed_minors,
            Threshold {
                allowed: Allowed::Count(1),
                level: Level::Error,
            }
        );
        assert_eq!(options.global.missed_majors, Policy::default().missed_majors);
    }

    #[rstest]
    #[case("true", Allowed::Always)]
    #[case("false", Allowed::Count(0))]
    #[case("3", Allowed::Count(3))]
    fn allowed_accepts_flags_and_counts(#[case] json: &str, #[case] expected: Allowed) {
        let allowed: Allowed = serde_json::from_str(json).unwrap();
        assert_eq!(allowed, expected);
    }

    #[test]
    fn negative_allowed_is_rejected() {
        assert!(serde_json::from_str::<Allowed>("-1").is_err());
    }

    #[rstest]
    #[case("\"warn\"", Level::Warn)]
    #[case("\"error\"", Level::Error)]
    #[case("\"silent\"", Level::Silent)]
    #[case("\"debug\"", Level::Silent)]
    fn unknown_levels_are_silent(#[case] json: &str, #[case] expected: Level) {
        let level: Level = serde_json::from_str(json).unwrap();
        assert_eq!(level, expected);
    }

    #[rstest]
    #[case(Allowed::Always, u64::MAX, false)]
    #[case(Allowed::Count(1), 1, false)]
    #[case(Allowed::Count(1), 2, true)]
    #[case(Allowed::Count(0), 0, false)]
    fn allowed_limits(#[case] allowed: Allowed, #[case] missed: u64, #[case] exceeded: bool) {
        assert_eq!(allowed.is_exceeded_by(missed), exceeded);
    }

    #[test]
    fn module_policy_replaces_global_entirely() {
        let options = Options::from_json(indoc! {r#"
            {
                "global": {
                    "missedMajors": { "allowed": 5, "level": "warn" },
                    "missedPatches": { "allowed": true },
                    "showVersions": true
                },
                "modules": {
                    "lodash": { "missedMinors": { "allowed": 0 } }
                }
            }
        "#})
        .unwrap();

        let lodash = options.policy_for("lodash");
        // Not inherited from `global`:
        assert_eq!(lodash.missed_majors, Policy::default().missed_majors);
        assert_eq!(lodash.missed_patches, Policy::default().missed_patches);
        assert!(!lodash.show_versions);
        assert_eq!(
            lodash.missed_minors,
            Threshold {
                allowed: Allowed::Count(0),
                level: Level::Warn,
            }
        );

        let other = options.policy_for("express");
        assert_eq!(other, &options.global);
        assert_eq!(other.missed_majors.allowed, Allowed::Count(5));
        assert!(other.show_versions);
    }

    #[test]
    fn load_without_file_uses_defaults_or_fails_for_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(Options::load(Some(&missing)).is_err());

        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "output": { "visual": false } }"#).unwrap();
        let options = Options::load(Some(&path)).unwrap();
        assert!(!options.output.visual);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Options::load(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration file"));
    }
}
