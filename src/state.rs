use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::{CachedLoader, FileSource, MemoryCache};
use crate::data::model::{Table, Value};
use crate::data::recode::recode;
use crate::report::dashboard::{Controls, Dashboard};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    loader: CachedLoader<FileSource, MemoryCache>,

    /// File currently shown.
    pub data_path: PathBuf,

    /// Loaded and recoded table (empty when loading failed).
    pub table: Arc<Table>,

    /// Current control values.
    pub controls: Controls,

    /// Sections computed from `table` and `controls` (cached).
    pub dashboard: Dashboard,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = Self {
            data_path: config.data_path.clone(),
            config,
            loader: CachedLoader::from_files(),
            table: Arc::new(Table::empty()),
            controls: Controls::default(),
            dashboard: Dashboard::Unavailable {
                message: String::new(),
            },
            status_message: None,
        };
        state.reload();
        state
    }

    /// Switch to another file.
    pub fn open(&mut self, path: PathBuf) {
        self.data_path = path;
        self.controls = Controls::default();
        self.reload();
    }

    /// Load (or fetch from the cache) the current file, recode it and rebuild
    /// the dashboard.
    pub fn reload(&mut self) {
        let outcome = self.loader.load(&self.data_path);
        self.status_message = outcome.error.as_ref().map(|e| e.to_string());
        self.table = Arc::new(recode(&outcome.table));
        log::debug!("{} file(s) cached", self.loader.cache().len());
        self.refresh();
    }

    /// Recompute the dashboard after a control change.
    pub fn refresh(&mut self) {
        self.dashboard = Dashboard::build(&self.table, &self.controls, &self.config);
    }

    pub fn set_category(&mut self, category: &str) {
        if self.controls.category != category {
            self.controls.category = category.to_string();
            self.refresh();
        }
    }

    /// Set the inclusive salary range, swapping the bounds if needed.
    pub fn set_salary_range(&mut self, lo: i64, hi: i64) {
        let range = Some((lo.min(hi), lo.max(hi)));
        if self.controls.salary_range != range {
            self.controls.salary_range = range;
            self.refresh();
        }
    }

    /// Toggle one experience level in the multi-select.
    pub fn toggle_experience(&mut self, value: &Value) {
        toggle(&mut self.controls.experience, value);
        self.refresh();
    }

    /// Toggle one company size in the multi-select.
    pub fn toggle_company_size(&mut self, value: &Value) {
        toggle(&mut self.controls.company_size, value);
        self.refresh();
    }

    pub fn set_show_preview(&mut self, show: bool) {
        if self.controls.show_preview != show {
            self.controls.show_preview = show;
            self.refresh();
        }
    }
}

fn toggle(selected: &mut std::collections::BTreeSet<Value>, value: &Value) {
    if !selected.remove(value) {
        selected.insert(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn state_for(contents: &str) -> (tempfile::NamedTempFile, AppState) {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        let config = DashboardConfig {
            data_path: file.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        let state = AppState::new(config);
        (file, state)
    }

    const CSV: &str = "\
work_year,experience_level,employment_type,job_title,salary_in_usd,employee_residence,remote_ratio,company_location,company_size
2023,SE,FT,Data Scientist,100,FR,100,FR,L
2023,EN,FT,Data Analyst,300,FR,0,FR,S
";

    #[test]
    fn loads_and_recodes_at_startup() {
        let (_file, state) = state_for(CSV);
        assert!(state.status_message.is_none());
        let view = state.dashboard.view().expect("ready");
        assert_eq!(view.metrics.remote_mean_salary, Some(100.0));
        assert_eq!(state.table.get(0, "experience_level"), Some(&Value::from("Senior")));
    }

    #[test]
    fn controls_rebuild_the_view() {
        let (_file, mut state) = state_for(CSV);
        state.toggle_experience(&Value::from("Débutant"));
        let targeted = &state.dashboard.view().expect("ready").targeted;
        assert_eq!(targeted.numeric_values("salary_in_usd"), vec![300.0]);

        state.toggle_experience(&Value::from("Débutant"));
        state.set_salary_range(200, 50);
        assert_eq!(state.controls.salary_range, Some((50, 200)));
        let targeted = &state.dashboard.view().expect("ready").targeted;
        assert_eq!(targeted.numeric_values("salary_in_usd"), vec![100.0]);
    }

    #[test]
    fn missing_file_shows_a_message() {
        let dir = tempfile::tempdir().expect("dir");
        let state = AppState::new(DashboardConfig {
            data_path: dir.path().join("ds_salaries.csv"),
            ..DashboardConfig::default()
        });
        assert!(state.table.is_empty());
        assert!(state.dashboard.view().is_none());
        assert!(
            state
                .status_message
                .is_some_and(|m| m.contains("ds_salaries.csv"))
        );
    }
}
