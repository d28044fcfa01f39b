//! Dashfolio - analytics dashboard over static CSV datasets
//!
//! Builds the dashboard pages (about, e-commerce, financial, social media),
//! then renders them once into a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, output file, etc.)
//!   2 - At least one page failed to load its dataset

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod pages;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{DashboardReport, Page, PageReport, ReportMetadata};
use report::RenderOptions;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // `[general] verbose` feeds the log level, so config comes first
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    info!("Dashfolio v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .dashfolio.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the data directory, datasets and your profile.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build every selected page and write the report. Returns exit code (0 or 2).
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    let pages = args.selected_pages();
    let to_stdout = config.general.output == "-";

    if args.dry_run {
        return handle_dry_run(&pages, config);
    }

    if !to_stdout && !args.quiet {
        println!(
            "📊 Building {} page(s) from {}",
            pages.len(),
            config.general.data_dir.display()
        );
    }

    let mut page_reports = Vec::with_capacity(pages.len());
    for page in pages {
        match pages::build(page, config) {
            Ok(report) => page_reports.push(report),
            Err(e) => {
                error!("Page '{}' failed: {}", page, e);
                page_reports.push(PageReport::failed(page, e.to_string()));
            }
        }
    }

    let pages_failed = page_reports.iter().filter(|p| !p.is_successful()).count();

    let report = DashboardReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            data_dir: config.general.data_dir.display().to_string(),
            pages_rendered: page_reports.len() - pages_failed,
            pages_failed,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        pages: page_reports,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, RenderOptions::from(&config.report))
        }
    };

    if to_stdout {
        println!("{}", output);
    } else {
        std::fs::write(&config.general.output, &output)
            .with_context(|| format!("Failed to write report to {}", config.general.output))?;

        if !args.quiet {
            println!("\n✅ Report saved to: {}", config.general.output);
        }
    }

    if pages_failed > 0 {
        for page in report.failed_pages() {
            warn!(
                "Page '{}' was not rendered: {}",
                page.page,
                page.error.as_deref().unwrap_or("unknown error")
            );
        }
        eprintln!(
            "\n⛔ {} page(s) could not be built. Failing (exit code 2).",
            pages_failed
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: load each dataset, print what was found, exit.
fn handle_dry_run(pages: &[Page], config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: loading datasets (no report written)...\n");

    let mut failed = 0;
    for page in pages {
        let Some((path, spec)) = pages::dataset_for(*page, config) else {
            println!("   📄 {}: no dataset", page);
            continue;
        };

        match loader::load(&path, &spec) {
            Ok(dataset) => println!(
                "   📄 {}: {} ({} rows read, {} kept, {} dropped, {} duplicate)",
                page,
                path.display(),
                dataset.rows_read,
                dataset.records.len(),
                dataset.rows_dropped,
                dataset.duplicate_lines.len()
            ),
            Err(e) => {
                failed += 1;
                println!("   ❌ {}: {}", page, e);
            }
        }
    }

    if failed > 0 {
        println!("\n⛔ {} dataset(s) could not be loaded.", failed);
        return Ok(2);
    }

    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
