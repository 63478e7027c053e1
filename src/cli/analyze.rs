//! Analyze command
//!
//! 1. Load the project config and apply CLI overrides
//! 2. Walk PATH for `.class` files and read them
//! 3. Extract models in parallel (progress bar on stderr)
//! 4. Run the analysis and print the report
//! 5. Apply the `--fail-on` threshold

use anyhow::{Context, Result};
use console::style;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::output;
use super::Cli;
use classlens::config::{load_config_file, load_project_config, ProjectConfig};
use classlens::{extract_all, AnalysisContext, Analyzer, ClassSource};

const CLASS_EXTENSION: &str = "class";

pub(super) fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", cli.path.display()))?;

    let config = load_config(cli, &root)?;
    let ctx = AnalysisContext::from_config(config).context("Invalid classifier configuration")?;
    let quiet = cli.format == "json";

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message("Collecting class files...");
    let files = collect_class_files(&root);
    spinner.finish_and_clear();

    if files.is_empty() {
        warn!("No .class files under {}", root.display());
    }
    info!("Found {} class files in {:?}", files.len(), start.elapsed());

    let (sources, mut errors) = read_sources(&root, &files);

    let bar = ProgressBar::new(sources.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓▒░  "),
    );
    bar.set_message("Extracting...");
    let tick = bar.clone();
    let ctx = ctx.with_progress(Arc::new(move |done: usize, _total: usize| {
        tick.set_position(done as u64)
    }));

    let extraction = extract_all(&ctx, &sources)?;
    bar.finish_with_message(format!(
        "{}Extracted {} types",
        style("✓ ").green(),
        style(extraction.models.len()).cyan()
    ));
    errors.extend(extraction.errors);

    let analyzer = Analyzer::new(ctx);
    let mut result = analyzer.run(extraction.models)?;
    errors.append(&mut result.errors);
    result.errors = errors;

    match cli.format.as_str() {
        "json" => println!("{}", output::render_json(&result)?),
        _ => print!("{}", output::render_text(&result, cli.explain_score, &analyzer)),
    }

    if !quiet {
        eprintln!(
            "{} Analysis finished in {:.2}s",
            style("✓").green(),
            start.elapsed().as_secs_f64()
        );
    }

    if output::exceeds_threshold(cli.fail_on.as_deref(), &result.summary) {
        if let Some(threshold) = &cli.fail_on {
            eprintln!("Failing due to --fail-on={} threshold", threshold);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Explicit `--config` wins, then project files under PATH. CLI prefixes and
/// workers are layered on top.
fn load_config(cli: &Cli, root: &Path) -> Result<ProjectConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_project_config(root),
    };
    config.analysis.include.extend(cli.include.iter().cloned());
    config.analysis.exclude.extend(cli.exclude.iter().cloned());
    if cli.workers.is_some() {
        config.analysis.workers = cli.workers;
    }
    Ok(config)
}

/// Every `.class` file under `root`, sorted.
///
/// Build output directories are usually git-ignored, so ignore files are
/// not consulted.
fn collect_class_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(CLASS_EXTENSION))
        .collect();
    files.sort();
    files
}

fn read_sources(root: &Path, files: &[PathBuf]) -> (Vec<ClassSource>, Vec<String>) {
    let read: Vec<_> = files
        .par_iter()
        .map(|path| {
            let origin = path
                .strip_prefix(root)
                .unwrap_or(path)
                .display()
                .to_string();
            (origin, std::fs::read(path))
        })
        .collect();

    let mut sources = Vec::with_capacity(read.len());
    let mut errors = Vec::new();
    for (origin, bytes) in read {
        match bytes {
            Ok(bytes) => sources.push(ClassSource::new(origin, bytes)),
            Err(e) => {
                debug!("Failed to read {}: {}", origin, e);
                errors.push(format!("{}: {}", origin, e));
            }
        }
    }
    (sources, errors)
}
