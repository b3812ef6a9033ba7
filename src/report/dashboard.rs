use std::collections::BTreeSet;

use crate::config::DashboardConfig;
use crate::data::aggregate::{
    self, Aggregation, CorrelationMatrix, PivotTable, correlation_matrix, group_aggregate,
    pivot_mean,
};
use crate::data::filter::{self, FilterSet, Predicate};
use crate::data::model::{Table, Value};
use crate::data::recode::FULLY_REMOTE;

use super::chart::{ChartKind, ChartSpec};

pub const SALARY: &str = "salary_in_usd";
pub const EXPERIENCE: &str = "experience_level";
pub const COMPANY_SIZE: &str = "company_size";
pub const REMOTE: &str = "remote_ratio";
pub const JOB_TITLE: &str = "job_title";
pub const WORK_YEAR: &str = "work_year";
pub const EMPLOYMENT_TYPE: &str = "employment_type";
pub const COMPANY_LOCATION: &str = "company_location";
pub const RESIDENCE: &str = "employee_residence";

/// Columns offered for the "average by category" chart.
pub const CATEGORY_CHOICES: [&str; 4] = [EXPERIENCE, EMPLOYMENT_TYPE, JOB_TITLE, COMPANY_LOCATION];

pub const NO_DATA_MESSAGE: &str = "Veuillez charger le fichier de données pour commencer l'analyse.";

/// French display name of a column.
pub fn column_label(column: &str) -> &str {
    match column {
        SALARY => "Salaire (USD)",
        EXPERIENCE => "Niveau d'expérience",
        COMPANY_SIZE => "Taille d'entreprise",
        REMOTE => "Mode de travail",
        JOB_TITLE => "Métier",
        WORK_YEAR => "Année",
        EMPLOYMENT_TYPE => "Type d'emploi",
        COMPANY_LOCATION => "Localisation",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// User controls
// ---------------------------------------------------------------------------

/// State of every interactive control. The view is a pure function of the
/// recoded table and these controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    /// Column of the "average by category" chart.
    pub category: String,
    /// Inclusive salary range; `None` spans the whole data.
    pub salary_range: Option<(i64, i64)>,
    /// Selected experience labels; empty selects all.
    pub experience: BTreeSet<Value>,
    /// Selected company sizes; empty selects all.
    pub company_size: BTreeSet<Value>,
    pub show_preview: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            category: EXPERIENCE.to_string(),
            salary_range: None,
            experience: BTreeSet::new(),
            company_size: BTreeSet::new(),
            show_preview: false,
        }
    }
}

impl Controls {
    /// Salary range predicate; the data bounds when no range is set.
    pub fn salary_filter(&self, bounds: (i64, i64)) -> FilterSet {
        let (lo, hi) = self.salary_range.unwrap_or(bounds);
        Predicate::range(SALARY, lo as f64, hi as f64).into()
    }

    /// Multi-select predicates on experience and company size.
    pub fn category_filter(&self) -> FilterSet {
        FilterSet::new()
            .with(Predicate::one_of(EXPERIENCE, self.experience.iter().cloned()))
            .with(Predicate::one_of(COMPANY_SIZE, self.company_size.iter().cloned()))
    }
}

// ---------------------------------------------------------------------------
// Key figures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub mean_salary: Option<f64>,
    pub remote_mean_salary: Option<f64>,
    pub missing_cells: usize,
}

impl Metrics {
    pub fn compute(table: &Table) -> Self {
        Self {
            mean_salary: aggregate::mean(table, SALARY),
            remote_mean_salary: aggregate::mean_where(
                table,
                SALARY,
                &Predicate::equals(REMOTE, FULLY_REMOTE),
            ),
            missing_cells: aggregate::null_count(table),
        }
    }

    /// Dollar amount rounded to zero decimals and printed as a float
    /// (`109167.0 $`), or "n/a".
    pub fn format_amount(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.1} $", aggregate::round0(v)),
            None => "n/a".to_string(),
        }
    }

    pub fn missing_label(&self) -> String {
        match self.missing_cells {
            0 => "Aucune".to_string(),
            n => n.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// The full dashboard
// ---------------------------------------------------------------------------

/// Every section of the dashboard, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub metrics: Metrics,
    /// First rows of the data, only when the preview is enabled.
    pub preview: Option<Table>,
    pub summary: Table,
    /// Salary distribution in the focus country; `None` when it has no rows.
    pub country_box: Option<ChartSpec>,
    pub focus_country: String,
    pub category_bar: ChartSpec,
    pub correlation: CorrelationMatrix,
    pub correlation_heatmap: ChartSpec,
    pub title_evolution: ChartSpec,
    pub median_by_size: ChartSpec,
    /// Integer salary bounds for the range control.
    pub salary_bounds: (i64, i64),
    pub remote_strip: ChartSpec,
    pub experience_options: Vec<Value>,
    pub company_size_options: Vec<Value>,
    /// Rows passing the salary range and both multi-selects.
    pub targeted: Table,
    pub top_locations: ChartSpec,
    pub pivot: PivotTable,
}

/// Either a full dashboard or the reason nothing can be shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Unavailable { message: String },
    Ready(Box<DashboardView>),
}

impl Dashboard {
    /// Compute every section from the recoded table. An empty table skips all
    /// of them.
    pub fn build(table: &Table, controls: &Controls, config: &DashboardConfig) -> Self {
        if table.is_empty() {
            return Dashboard::Unavailable {
                message: NO_DATA_MESSAGE.to_string(),
            };
        }
        Dashboard::Ready(Box::new(DashboardView::build(table, controls, config)))
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            Dashboard::Ready(view) => Some(view),
            Dashboard::Unavailable { .. } => None,
        }
    }
}

impl DashboardView {
    /// Warning shown instead of the distribution chart when the focus country
    /// has no rows.
    pub fn country_warning(&self) -> String {
        format!("Pas de données disponibles pour {}.", self.focus_country)
    }

    pub fn build(table: &Table, controls: &Controls, config: &DashboardConfig) -> Self {
        let salary_bounds = table
            .min_max(SALARY)
            .map(|(lo, hi)| (lo.floor() as i64, hi.ceil() as i64))
            .unwrap_or((0, 0));
        let salary_filter = controls.salary_filter(salary_bounds);
        let salary_filtered = filter::apply(table, &salary_filter);
        let targeted_filter = salary_filter.and(controls.category_filter());
        log::debug!(
            "{} of {} filters active",
            targeted_filter.predicates().iter().filter(|p| p.is_active()).count(),
            targeted_filter.predicates().len()
        );
        let targeted = filter::apply(table, &targeted_filter);
        let correlation = correlation_matrix(table);

        DashboardView {
            metrics: Metrics::compute(table),
            preview: controls.show_preview.then(|| table.head(config.preview_rows)),
            summary: aggregate::describe(table),
            country_box: country_box(table, &config.focus_country),
            focus_country: config.focus_country.clone(),
            category_bar: category_bar(table, &controls.category),
            correlation_heatmap: ChartSpec::heatmap(
                "Corrélations entre variables numériques",
                &correlation,
            ),
            correlation,
            title_evolution: title_evolution(table, config.top_job_titles),
            median_by_size: median_by_size(table),
            salary_bounds,
            remote_strip: remote_strip(salary_filtered),
            experience_options: table.unique_values(EXPERIENCE),
            company_size_options: table.unique_values(COMPANY_SIZE),
            targeted,
            top_locations: top_locations(table, config.top_locations),
            pivot: pivot_mean(table, SALARY, EXPERIENCE, REMOTE),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn country_box(table: &Table, country: &str) -> Option<ChartSpec> {
    let rows = filter::apply(table, &Predicate::equals(RESIDENCE, country).into());
    if rows.is_empty() {
        log::debug!("no rows for residence {country}");
        return None;
    }
    Some(
        ChartSpec::new(
            ChartKind::Box,
            format!("Dispersion des salaires ({country}) par niveau d'expérience"),
            EXPERIENCE,
            SALARY,
            rows,
        )
        .color(EXPERIENCE)
        .label(SALARY, column_label(SALARY))
        .label(EXPERIENCE, column_label(EXPERIENCE)),
    )
}

fn category_bar(table: &Table, category: &str) -> ChartSpec {
    let data = group_aggregate(table, &[category], SALARY, Aggregation::Mean).sort_desc(SALARY);
    ChartSpec::new(
        ChartKind::Bar,
        format!("Salaire moyen par {category}"),
        category,
        SALARY,
        data,
    )
    .color(SALARY)
    .label(SALARY, "Salaire moyen (USD)")
    .label(category, column_label(category))
}

fn title_evolution(table: &Table, top: usize) -> ChartSpec {
    let titles = aggregate::top_values(table, JOB_TITLE, top);
    let rows = filter::apply(table, &Predicate::one_of(JOB_TITLE, titles).into());
    let data = group_aggregate(&rows, &[WORK_YEAR, JOB_TITLE], SALARY, Aggregation::Mean);
    ChartSpec::new(
        ChartKind::Line,
        "Évolution annuelle du salaire moyen par métier",
        WORK_YEAR,
        SALARY,
        data,
    )
    .color(JOB_TITLE)
    .label(WORK_YEAR, column_label(WORK_YEAR))
    .label(SALARY, "Salaire moyen (USD)")
    .label(JOB_TITLE, column_label(JOB_TITLE))
}

fn median_by_size(table: &Table) -> ChartSpec {
    let data = group_aggregate(table, &[EXPERIENCE, COMPANY_SIZE], SALARY, Aggregation::Median);
    ChartSpec::new(
        ChartKind::GroupedBar,
        "Impact de la taille d'entreprise sur le salaire médian",
        EXPERIENCE,
        SALARY,
        data,
    )
    .color(COMPANY_SIZE)
    .label(SALARY, "Salaire médian (USD)")
    .label(EXPERIENCE, column_label(EXPERIENCE))
    .label(COMPANY_SIZE, column_label(COMPANY_SIZE))
}

fn remote_strip(salary_filtered: Table) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Strip,
        "Répartition des salaires selon le taux de télétravail",
        REMOTE,
        SALARY,
        salary_filtered,
    )
    .color(EXPERIENCE)
    .label(REMOTE, column_label(REMOTE))
    .label(SALARY, column_label(SALARY))
    .label(EXPERIENCE, column_label(EXPERIENCE))
}

fn top_locations(table: &Table, n: usize) -> ChartSpec {
    let data = group_aggregate(table, &[COMPANY_LOCATION], SALARY, Aggregation::Mean)
        .sort_desc(SALARY)
        .head(n);
    ChartSpec::new(
        ChartKind::Bar,
        format!("Top {n} des pays (Moyenne en USD)"),
        COMPANY_LOCATION,
        SALARY,
        data,
    )
    .color(SALARY)
    .label(SALARY, "Salaire moyen (USD)")
    .label(COMPANY_LOCATION, column_label(COMPANY_LOCATION))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::cache::tests::FixtureSource;
    use crate::data::cache::{CachedLoader, MemoryCache};
    use crate::data::loader::read_csv;
    use crate::data::recode::recode;

    const SAMPLE: &str = "\
work_year,experience_level,employment_type,job_title,salary,salary_currency,salary_in_usd,employee_residence,remote_ratio,company_location,company_size
2023,SE,FT,Data Scientist,80000,EUR,90000,FR,100,FR,L
2023,EN,FT,Data Analyst,40000,EUR,45000,FR,0,FR,S
2022,EN,CT,Data Analyst,50000,USD,50000,US,50,US,M
2022,SE,FT,Data Engineer,150000,USD,150000,US,0,US,L
2021,EX,FL,Data Scientist,250000,USD,250000,US,100,US,M
2021,MI,FT,Data Scientist,70000,USD,70000,GB,100,GB,S
";

    fn recoded() -> Table {
        let raw = read_csv(csv::Reader::from_reader(SAMPLE.as_bytes())).expect("parse");
        recode(&raw)
    }

    fn build(controls: &Controls) -> DashboardView {
        DashboardView::build(&recoded(), controls, &DashboardConfig::default())
    }

    #[test]
    fn key_figures() {
        let view = build(&Controls::default());
        let mean = view.metrics.mean_salary.expect("mean");
        assert!((mean - 655_000.0 / 6.0).abs() < 1e-6);
        assert_eq!(Metrics::format_amount(view.metrics.mean_salary), "109167.0 $");
        assert_eq!(Metrics::format_amount(Some(2.5)), "2.0 $");
        let remote = view.metrics.remote_mean_salary.expect("remote mean");
        assert!((remote - 410_000.0 / 3.0).abs() < 1e-6);
        assert_eq!(view.metrics.missing_label(), "Aucune");
    }

    #[test]
    fn missing_cells_are_counted() {
        let table = Table::from_rows(
            vec![SALARY.into(), REMOTE.into()],
            vec![vec![Value::Integer(10), Value::Null]],
        );
        let metrics = Metrics::compute(&table);
        assert_eq!(metrics.missing_label(), "1");
        assert_eq!(metrics.remote_mean_salary, None);
        assert_eq!(Metrics::format_amount(None), "n/a");
    }

    #[test]
    fn category_bar_is_sorted_descending() {
        let view = build(&Controls {
            category: EMPLOYMENT_TYPE.to_string(),
            ..Controls::default()
        });
        let bar = &view.category_bar;
        assert_eq!(bar.kind, ChartKind::Bar);
        assert_eq!(bar.x, EMPLOYMENT_TYPE);
        assert_eq!(
            bar.categories(),
            vec![
                Value::from("Freelance"),
                Value::from("Temps plein"),
                Value::from("Contrat")
            ]
        );
        assert_eq!(bar.x_label(), "Type d'emploi");
    }

    #[test]
    fn focus_country_box_or_nothing() {
        let view = build(&Controls::default());
        let chart = view.country_box.expect("rows for FR");
        assert_eq!(chart.kind, ChartKind::Box);
        assert_eq!(chart.data.len(), 2);

        let config = DashboardConfig {
            focus_country: "DE".into(),
            ..DashboardConfig::default()
        };
        let view = DashboardView::build(&recoded(), &Controls::default(), &config);
        assert!(view.country_box.is_none());
        assert_eq!(view.country_warning(), "Pas de données disponibles pour DE.");
    }

    #[test]
    fn evolution_follows_the_most_frequent_titles() {
        let config = DashboardConfig {
            top_job_titles: 2,
            ..DashboardConfig::default()
        };
        let view = DashboardView::build(&recoded(), &Controls::default(), &config);
        let groups = view.title_evolution.groups();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&Value::from("Data Scientist")));
        assert!(groups.contains(&Value::from("Data Analyst")));
        assert!(!groups.contains(&Value::from("Data Engineer")));
    }

    #[test]
    fn salary_range_and_multi_selects() {
        let controls = Controls {
            salary_range: Some((45_000, 150_000)),
            experience: [Value::from("Débutant"), Value::from("Senior")].into(),
            ..Controls::default()
        };
        let view = build(&controls);
        assert_eq!(view.salary_bounds, (45_000, 250_000));
        assert_eq!(view.remote_strip.data.len(), 5);
        assert_eq!(
            view.targeted.numeric_values(SALARY),
            vec![90_000.0, 45_000.0, 50_000.0, 150_000.0]
        );

        let controls = Controls {
            company_size: [Value::from("Grande")].into(),
            ..controls
        };
        assert_eq!(build(&controls).targeted.numeric_values(SALARY), vec![90_000.0, 150_000.0]);
    }

    #[test]
    fn top_locations_and_pivot() {
        let view = build(&Controls::default());
        assert_eq!(
            view.top_locations.categories(),
            vec![Value::from("US"), Value::from("GB"), Value::from("FR")]
        );
        assert_eq!(
            view.pivot.get(&Value::from("Débutant"), &Value::from("Hybride")),
            Some(50_000.0)
        );
        assert_eq!(
            view.pivot.get(&Value::from("Expert"), &Value::from("Présentiel")),
            None
        );
    }

    #[test]
    fn correlation_only_over_numeric_columns() {
        let view = build(&Controls::default());
        assert_eq!(view.correlation.columns, vec![WORK_YEAR, "salary", SALARY]);
        assert_eq!(view.correlation_heatmap.data.len(), 9);
    }

    #[test]
    fn preview_only_when_enabled() {
        assert!(build(&Controls::default()).preview.is_none());
        let view = build(&Controls {
            show_preview: true,
            ..Controls::default()
        });
        assert_eq!(view.preview.map(|t| t.len()), Some(6));
    }

    #[test]
    fn missing_file_skips_every_section() {
        let mut loader = CachedLoader::new(FixtureSource::default(), MemoryCache::new());
        let outcome = loader.load(Path::new("ds_salaries.csv"));
        assert!(outcome.table.is_empty());
        assert!(outcome.error.as_ref().is_some_and(|e| e.is_not_found()));

        let dashboard = Dashboard::build(
            &recode(&outcome.table),
            &Controls::default(),
            &DashboardConfig::default(),
        );
        assert_eq!(
            dashboard,
            Dashboard::Unavailable {
                message: NO_DATA_MESSAGE.to_string()
            }
        );
        assert!(dashboard.view().is_none());
    }

    #[test]
    fn fixture_source_feeds_the_whole_pipeline() {
        let raw = read_csv(csv::Reader::from_reader(SAMPLE.as_bytes())).expect("parse");
        let mut loader = CachedLoader::new(FixtureSource::with("ds_salaries.csv", raw), MemoryCache::new());
        let outcome = loader.load(Path::new("ds_salaries.csv"));
        let dashboard = Dashboard::build(
            &recode(&outcome.table),
            &Controls::default(),
            &DashboardConfig::default(),
        );
        let view = dashboard.view().expect("ready");
        assert_eq!(view.targeted.len(), 6);
        assert_eq!(view.experience_options.len(), 4);
    }
}
