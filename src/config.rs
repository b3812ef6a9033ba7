use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Names the optional JSON configuration file.
pub const CONFIG_ENV: &str = "SALARY_DASHBOARD_CONFIG";
/// Overrides the dataset path.
pub const DATA_ENV: &str = "SALARY_DASHBOARD_DATA";

/// Dashboard settings. Every field has a default, so a config file only needs
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Dataset to load at startup.
    pub data_path: PathBuf,
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Most frequent job titles followed over time.
    pub top_job_titles: usize,
    /// Best paying company locations shown.
    pub top_locations: usize,
    /// `employee_residence` code of the country in the distribution chart.
    pub focus_country: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("ds_salaries.csv"),
            preview_rows: 10,
            top_job_titles: 10,
            top_locations: 5,
            focus_country: "FR".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the configuration: defaults, then the file named by
    /// `SALARY_DASHBOARD_CONFIG`, then `SALARY_DASHBOARD_DATA`, then the first
    /// command-line argument.
    pub fn resolve(
        config_file: Option<PathBuf>,
        data_env: Option<PathBuf>,
        mut args: impl Iterator<Item = String>,
    ) -> anyhow::Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(path) = data_env {
            config.data_path = path;
        }
        if let Some(arg) = args.next() {
            config.data_path = PathBuf::from(arg);
        }
        Ok(config)
    }

    /// [`resolve`](Self::resolve) from the process environment. A broken
    /// config file is logged and ignored.
    pub fn from_env() -> Self {
        let config_file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let data_env = std::env::var_os(DATA_ENV).map(PathBuf::from);
        match Self::resolve(config_file, data_env.clone(), std::env::args().skip(1)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring configuration: {e:#}");
                Self::resolve(None, data_env, std::env::args().skip(1)).unwrap_or_default()
            }
        }
    }
}
