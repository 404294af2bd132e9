// Copyright (C) 2026 by GiGa infosystems

//! Apply a [`Policy`] to a [`GapReport`]

use crate::config::{Level, Policy, Threshold};
use crate::gap::GapReport;
use serde::Serialize;

/// The outcome of a single category of missed releases
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decision {
    /// Within the allowed threshold
    Pass,
    /// The threshold was exceeded, with the configured severity
    Breach { level: Level, missed: u64 },
}

impl Decision {
    /// Decide for `missed` releases of a single category
    pub fn new(threshold: &Threshold, missed: u64) -> Self {
        if threshold.allowed.is_exceeded_by(missed) {
            Decision::Breach {
                level: threshold.level,
                missed,
            }
        } else {
            Decision::Pass
        }
    }

    /// Only breaches at [`Level::Error`] fail a module
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Decision::Breach {
                level: Level::Error,
                ..
            }
        )
    }
}

/// The overall status of a module
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// The decisions for all categories of a module
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Decisions {
    pub majors: Decision,
    pub minors: Decision,
    pub patches: Decision,
}

impl Decisions {
    /// Decide each category of `report` independently
    pub fn evaluate(policy: &Policy, report: &GapReport) -> Self {
        Decisions {
            majors: Decision::new(&policy.missed_majors, report.missed_majors),
            minors: Decision::new(&policy.missed_minors, report.missed_minors),
            patches: Decision::new(&policy.missed_patches, report.missed_patches),
        }
    }

    pub fn status(&self) -> Status {
        if [self.majors, self.minors, self.patches]
            .into_iter()
            .any(Decision::is_failure)
        {
            Status::Fail
        } else {
            Status::Success
        }
    }
}
