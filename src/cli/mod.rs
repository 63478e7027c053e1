//! CLI definition and dispatch

mod analyze;
mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Parse and validate workers count (0-64, 0 = auto)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// classlens - bytecode-level code health analysis
#[derive(Parser, Debug)]
#[command(name = "classlens")]
#[command(
    version,
    about = "Static analysis of compiled JVM classes: coupling, cohesion, complexity and dependency cycles",
    after_help = "\
Examples:
  classlens target/classes                     Analyze a compiled output directory
  classlens build --include com.acme.          Only treat com.acme.* as project types
  classlens . --format json > report.json      JSON output for scripting
  classlens . --fail-on high                   Exit code 1 if high+ issues (CI mode)"
)]
pub struct Cli {
    /// Directory containing .class files (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Config file (default: classlens.toml or .classlensrc.json under PATH)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Treat types with this name prefix as project types (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Treat types with this name prefix as external (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Number of parallel workers (0 = auto)
    #[arg(long, env = "CLASSLENS_WORKERS", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Exit with code 1 if issues at this severity or higher exist
    #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
    pub fail_on: Option<String>,

    /// Explain the score with a full breakdown
    #[arg(long)]
    pub explain_score: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    analyze::run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("0"), Ok(0));
        assert_eq!(parse_workers("8"), Ok(8));
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_prefixes() {
        let cli = Cli::parse_from([
            "classlens",
            "build/classes",
            "--include",
            "com.acme.",
            "--include",
            "org.acme.",
            "--exclude",
            "com.acme.generated.",
            "--fail-on",
            "high",
        ]);
        assert_eq!(cli.path, PathBuf::from("build/classes"));
        assert_eq!(cli.include, vec!["com.acme.", "org.acme."]);
        assert_eq!(cli.exclude, vec!["com.acme.generated."]);
        assert_eq!(cli.fail_on.as_deref(), Some("high"));
        assert_eq!(cli.format, "text");
    }
}
