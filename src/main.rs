// Copyright (C) 2026 by GiGa infosystems

use std::path::PathBuf;

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Report, bail},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use update_gaps::config::Options;
use update_gaps::manifest::Manifest;
use update_gaps::registry;
use update_gaps::report::write_documents;
use update_gaps::runner::{Runner, progress_bar};
use update_gaps::table;
use update_gaps::template::Templates;

/// This program checks how many major, minor & patch releases the installed dependencies of a
/// project are behind, and fails if a module exceeds the thresholds configured for it.
///
/// Supported manifests are `package.json` (using the `npm` CLI) & `Cargo.toml` (using the lock file
/// & crates.io).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The JSON configuration file
    ///
    /// Defaults to `update-gaps.config.json` in the working directory if it exists, and to the
    /// built-in defaults otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The manifest to check, overriding `include.jsonFile` of the configuration
    #[arg(long)]
    manifest_path: Option<PathBuf>,
    /// The path to a directory containing minijinja templates
    ///
    /// The template names are:
    /// * `report.xml.jinja` for the XML document. The default has one `<module>` element per module.
    /// * `report.json.jinja` for the JSON document. The default is a prettified JSON dump of the context.
    ///
    /// Inline templates from `output.xmlTemplate` & `output.jsonTemplate` take priority.
    ///
    /// The context is `modules`, a list of objects with the keys `name`, `installed`, `latest`,
    /// `missedMajors`, `missedMinors`, `missedPatches`, `versions` (a list of strings) & `status`
    /// (`success` or `fail`).
    ///
    /// Extra functions implemented:
    /// * `xml` (filter): Escapes a string for use in XML text or attribute values
    #[arg(short = 'T', long, verbatim_doc_comment)]
    template_path: Option<PathBuf>,
    /// Only print the table if a module failed, overriding `output.visual`
    #[arg(long)]
    no_visual: bool,
    /// Log debug output & show breaches of `silent` thresholds in the table
    #[arg(short, long)]
    debug: bool,
}

struct AppContext {
    options: Options,
    manifest: Manifest,
    templates: Templates,
    debug: bool,
}

impl TryFrom<Args> for AppContext {
    type Error = Report;

    fn try_from(args: Args) -> Result<Self> {
        let mut options = Options::load(args.config.as_deref())?;
        if let Some(manifest_path) = args.manifest_path {
            options.include.json_file = manifest_path;
        }
        if args.no_visual {
            options.output.visual = false;
        }

        let manifest = Manifest::read(&options.include.json_file)?;
        let templates = Templates::init(args.template_path, &options.output)?;

        Ok(AppContext {
            options,
            manifest,
            templates,
            debug: args.debug,
        })
    }
}

impl AppContext {
    /// Check all dependencies & produce the outputs, returning the number of failed modules
    fn check(&self) -> Result<usize> {
        let dependencies = self.manifest.dependencies(&self.options.include);
        info!(
            "Checking {} dependencies of {:?}",
            dependencies.len(),
            self.manifest.path
        );

        let registry = registry::for_manifest(&self.manifest)?;
        let progress = progress_bar(dependencies.len())?;
        let summary = Runner::new(&self.options, registry).run(&dependencies, &progress);
        progress.finish_and_clear();

        if !summary.skipped.is_empty() {
            debug!("Skipped modules: {}", summary.skipped.join(", "));
        }

        let failed = summary.failed();
        if self.options.output.visual || failed > 0 {
            println!("\n\n{}\n", table::render(&summary.outcomes, self.debug));
        }

        // Failures are already logged & don't change the result of the check
        let failures = write_documents(&summary.outcomes, &self.options.output, &self.templates);
        if !failures.is_empty() {
            debug!("{} document(s) could not be written", failures.len());
        }

        Ok(failed)
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "update_gaps=debug"
    } else {
        "update_gaps=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.debug);

    let ctx = AppContext::try_from(args)?;
    let failed = ctx.check()?;
    if failed > 0 {
        bail!("Check failed, because of {failed} error(s)!");
    }

    Ok(())
}
