//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.dashfolio.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".dashfolio.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset file names, relative to the data directory.
    #[serde(default)]
    pub datasets: DatasetConfig,

    /// Social media page settings.
    #[serde(default)]
    pub social: SocialConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Profile shown on the about page.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the CSV datasets.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_output() -> String {
    "dashboard_report.md".to_string()
}

/// Dataset file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_ecommerce")]
    pub ecommerce: String,

    #[serde(default = "default_financial")]
    pub financial: String,

    #[serde(default = "default_social")]
    pub social: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            ecommerce: default_ecommerce(),
            financial: default_financial(),
            social: default_social(),
        }
    }
}

fn default_ecommerce() -> String {
    "ecommerce_data.csv".to_string()
}

fn default_financial() -> String {
    "financial_data.csv".to_string()
}

fn default_social() -> String {
    "sample_social_media_data.csv".to_string()
}

/// Social media page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Year the monthly and hourly tables are restricted to.
    #[serde(default = "default_year")]
    pub year: i32,

    /// Number of users in the top users table.
    #[serde(default = "default_top_users")]
    pub top_users: usize,

    /// Platforms broken out as separate columns.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            top_users: default_top_users(),
            platforms: default_platforms(),
        }
    }
}

fn default_year() -> i32 {
    2023
}

fn default_top_users() -> usize {
    10
}

fn default_platforms() -> Vec<String> {
    vec!["Facebook", "Instagram", "Twitter"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Raw rows shown in each dataset preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Render chart blocks.
    #[serde(default = "default_true")]
    pub include_charts: bool,

    /// Render interpretive text.
    #[serde(default = "default_true")]
    pub include_narrative: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            include_charts: true,
            include_narrative: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_preview_rows() -> usize {
    5
}

/// Profile shown on the about page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub headline: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub experience: Vec<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub links: Vec<ProfileLink>,
}

/// A labelled link on the profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(year) = args.year {
            self.social.year = year;
        }
        if let Some(top_users) = args.top_users {
            self.social.top_users = top_users;
        }
        if let Some(preview_rows) = args.preview_rows {
            self.report.preview_rows = preview_rows;
        }
        if args.no_charts {
            self.report.include_charts = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Resolve a dataset file name against the data directory.
    pub fn dataset_path(&self, file_name: &str) -> PathBuf {
        self.general.data_dir.join(file_name)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
