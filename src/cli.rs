//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Page;
use clap::Parser;
use std::path::PathBuf;

/// Dashfolio - analytics dashboard over static CSV datasets
///
/// Builds the e-commerce, financial and social media analysis pages plus
/// an about page, and renders them into one Markdown or JSON report.
///
/// Examples:
///   dashfolio
///   dashfolio --page financial --format json -o -
///   dashfolio --data-dir ./data --page social --year 2024
///   dashfolio --dry-run
///   dashfolio --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Pages to build (repeatable). Defaults to every page.
    #[arg(short, long = "page", value_name = "PAGE", value_enum)]
    pub pages: Vec<Page>,

    /// Directory containing the CSV datasets
    ///
    /// Can also be set via DASHFOLIO_DATA_DIR or .dashfolio.toml.
    #[arg(short, long, value_name = "DIR", env = "DASHFOLIO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output file path for the report, `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dashfolio.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Year the social media monthly and hourly tables cover
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Number of users listed in the top users table
    #[arg(long, value_name = "COUNT")]
    pub top_users: Option<usize>,

    /// Raw dataset rows shown per page
    #[arg(long, value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// Leave chart blocks out of the report
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load every selected dataset and print load statistics
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .dashfolio.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_users == Some(0) {
            return Err("Top users must be at least 1".to_string());
        }

        if let Some(year) = self.year {
            if !(1900..=9999).contains(&year) {
                return Err(format!("Year out of range: {}", year));
            }
        }

        if let Some(ref data_dir) = self.data_dir {
            if !data_dir.is_dir() {
                return Err(format!(
                    "Data directory does not exist: {}",
                    data_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Pages to build, in navigation order without repeats.
    pub fn selected_pages(&self) -> Vec<Page> {
        if self.pages.is_empty() {
            return Page::ALL.to_vec();
        }

        let mut pages = self.pages.clone();
        pages.sort();
        pages.dedup();
        pages
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["dashfolio"];
        argv.extend_from_slice(args);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_select_every_page() {
        let args = parse(&[]);
        assert_eq!(args.selected_pages(), Page::ALL.to_vec());
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_selected_pages_in_navigation_order() {
        let args = parse(&["--page", "social", "-p", "ecommerce", "--page", "social"]);
        assert_eq!(args.selected_pages(), vec![Page::Ecommerce, Page::Social]);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_top_users() {
        let args = parse(&["--top-users", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let args = parse(&["--data-dir", "/definitely/not/a/dir"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&[]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
