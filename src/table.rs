// Copyright (C) 2026 by GiGa infosystems

//! The console table summarizing all checked modules

use crate::config::Level;
use crate::policy::{Decision, Status};
use crate::report::ModuleOutcome;
use console::{Alignment, measure_text_width, pad_str, style};

const SEPARATOR: &str = "  ┃  ";

const HEADERS: [&str; 8] = [
    "Name",
    "Installed",
    "Latest",
    "Major",
    "Minor",
    "Patch",
    "Versions",
    "Overall status",
];

/// A table of possibly styled, multi-line cells, aligned by their display width
#[derive(Debug)]
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        let column_widths = headers.iter().map(|h| measure_text_width(h)).collect();
        let headers = headers
            .iter()
            .map(|h| style(h).underlined().to_string())
            .collect();

        Table {
            headers,
            rows: Vec::new(),
            column_widths,
        }
    }

    fn add_row(&mut self, row: Vec<String>) {
        for (width, cell) in self.column_widths.iter_mut().zip(&row) {
            let cell_width = cell.lines().map(measure_text_width).max().unwrap_or(0);
            *width = (*width).max(cell_width);
        }
        self.rows.push(row);
    }

    fn render_row(&self, row: &[String], out: &mut Vec<String>) {
        let cells = row
            .iter()
            .map(|cell| cell.lines().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);

        for line in 0..height {
            let mut texts = (0..self.column_widths.len())
                .map(|column| {
                    cells
                        .get(column)
                        .and_then(|lines| lines.get(line))
                        .copied()
                        .unwrap_or("")
                })
                .collect::<Vec<_>>();
            while texts.last().is_some_and(|text| text.is_empty()) {
                texts.pop();
            }

            let rendered = texts
                .iter()
                .zip(&self.column_widths)
                .map(|(text, &width)| pad_str(text, width, Alignment::Left, None))
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            out.push(rendered.trim_end().to_owned());
        }
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_row(&self.headers, &mut lines);
        for row in &self.rows {
            self.render_row(row, &mut lines);
        }
        lines.join("\n")
    }
}

fn check_mark() -> String {
    style("✔").green().to_string()
}

/// The cell of a single category. `silent` breaches are only shown when debugging.
fn decision_cell(decision: Decision, debug: bool) -> String {
    match decision {
        Decision::Pass => check_mark(),
        Decision::Breach {
            level: Level::Warn,
            missed,
        } => style(format!("[WARNING] Missed {missed}"))
            .yellow()
            .to_string(),
        Decision::Breach {
            level: Level::Error,
            missed,
        } => style(format!("[ERROR] Missed {missed}")).red().to_string(),
        Decision::Breach {
            level: Level::Silent,
            missed,
        } if debug => format!("[DEBUG] Missed {missed}"),
        Decision::Breach {
            level: Level::Silent,
            ..
        } => check_mark(),
    }
}

/// The release history as a tree, with the installed & latest version underlined
fn version_tree(versions: &[String], installed: &str) -> String {
    versions
        .iter()
        .enumerate()
        .map(|(idx, version)| {
            let is_last = idx + 1 == versions.len();
            let branch = if is_last { '└' } else { '├' };
            if is_last || version == installed {
                format!("{branch} {}", style(version).underlined())
            } else {
                format!("{branch} {version}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_cell(status: Status) -> String {
    match status {
        Status::Success => check_mark(),
        Status::Fail => style("✘").red().to_string(),
    }
}

/// Render the table of all checked modules, in the order they were checked
pub fn render(outcomes: &[ModuleOutcome], debug: bool) -> String {
    let mut table = Table::new(&HEADERS);

    for outcome in outcomes {
        let report = &outcome.report;
        let versions = if outcome.show_versions {
            version_tree(&report.versions, &report.installed_version)
        } else {
            style("n.a.").italic().to_string()
        };

        table.add_row(vec![
            report.module_name.clone(),
            report.installed_version.clone(),
            report.latest_version.clone(),
            decision_cell(outcome.decisions.majors, debug),
            decision_cell(outcome.decisions.minors, debug),
            decision_cell(outcome.decisions.patches, debug),
            versions,
            status_cell(outcome.status()),
        ]);
    }

    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Allowed, Policy, Threshold};
    use crate::gap::analyze;
    use crate::policy::Decisions;
    use pretty_assertions::assert_eq;

    const S: &str = SEPARATOR;

    fn outcome(policy: &Policy, installed: &str, latest: &str, versions: &[&str]) -> ModuleOutcome {
        let report = analyze(
            "lodash",
            installed,
            latest,
            versions.iter().map(|v| v.to_string()).collect(),
        )
        .unwrap();
        ModuleOutcome {
            decisions: Decisions::evaluate(policy, &report),
            show_versions: policy.show_versions,
            report,
        }
    }

    fn plain(rendered: &str) -> Vec<String> {
        console::strip_ansi_codes(rendered)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn aligns_columns() {
        let outcomes = [outcome(
            &Policy::default(),
            "4.17.20",
            "4.17.21",
            &["4.17.20", "4.17.21"],
        )];

        assert_eq!(
            plain(&render(&outcomes, false)),
            [
                format!(
                    "Name  {S}Installed{S}Latest {S}Major{S}Minor{S}Patch             {S}Versions{S}Overall status"
                ),
                format!(
                    "lodash{S}4.17.20  {S}4.17.21{S}✔    {S}✔    {S}[WARNING] Missed 1{S}n.a.    {S}✔"
                ),
            ]
        );
    }

    #[test]
    fn version_tree_spans_multiple_lines() {
        let policy = Policy {
            show_versions: true,
            ..Policy::default()
        };
        let outcomes = [outcome(&policy, "1.0.0", "2.0.0", &["1.0.0", "2.0.0"])];

        let lines = plain(&render(&outcomes, false));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("[ERROR] Missed 1"));
        assert!(lines[1].contains("├ 1.0.0"));
        assert!(lines[1].ends_with("✘"));
        assert!(lines[2].ends_with(&format!("{S}└ 2.0.0")));
        assert!(lines[2].starts_with("      "));
    }

    #[test]
    fn silent_breaches_only_show_when_debugging() {
        let policy = Policy {
            missed_patches: Threshold {
                allowed: Allowed::Count(0),
                level: Level::Silent,
            },
            ..Policy::default()
        };
        let outcomes = [outcome(&policy, "1.0.0", "1.0.1", &["1.0.0", "1.0.1"])];

        let lines = plain(&render(&outcomes, false));
        assert!(!lines[1].contains("Missed"));

        let lines = plain(&render(&outcomes, true));
        assert!(lines[1].contains("[DEBUG] Missed 1"));
    }

    #[test]
    fn tree_marks_last_version() {
        let versions = ["1.0.0".to_owned(), "1.0.1".to_owned(), "1.1.0".to_owned()];
        let tree = console::strip_ansi_codes(&version_tree(&versions, "1.0.0")).into_owned();
        assert_eq!(tree, "├ 1.0.0\n├ 1.0.1\n└ 1.1.0");
    }
}
