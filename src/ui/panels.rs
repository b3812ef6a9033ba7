use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::Value;
use crate::report::dashboard::{
    CATEGORY_CHOICES, Dashboard, DashboardView, Metrics, column_label,
};
use crate::state::AppState;
use crate::ui::{plot, tables};

const TITLE: &str = "Tableau de bord sur les salaires en science des données";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("⚙️ Filtres de recherche");
    ui.separator();

    let Some(view) = state.dashboard.view() else {
        ui.label("Aucune donnée chargée.");
        return;
    };

    // Clone what we need so we can mutate state inside the widgets.
    let bounds = view.salary_bounds;
    let experience_options = view.experience_options.clone();
    let company_size_options = view.company_size_options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Salary range ----
            ui.strong("Plage de salaire (USD)");
            let (mut lo, mut hi) = state.controls.salary_range.unwrap_or(bounds);
            let min_changed = ui
                .add(egui::Slider::new(&mut lo, bounds.0..=bounds.1).text("min"))
                .changed();
            let max_changed = ui
                .add(egui::Slider::new(&mut hi, bounds.0..=bounds.1).text("max"))
                .changed();
            if min_changed || max_changed {
                state.set_salary_range(lo, hi);
            }
            ui.separator();

            // ---- Category for the bar chart ----
            ui.strong("Comparer le salaire par");
            let current = state.controls.category.clone();
            egui::ComboBox::from_id_salt("category")
                .selected_text(column_label(&current))
                .show_ui(ui, |ui: &mut Ui| {
                    for choice in CATEGORY_CHOICES {
                        if ui
                            .selectable_label(current == choice, column_label(choice))
                            .clicked()
                        {
                            state.set_category(choice);
                        }
                    }
                });
            ui.separator();

            // ---- Multi-selects ----
            multi_select(ui, "Niveau d'expérience", &experience_options, |value| {
                state.controls.experience.contains(value)
            })
            .into_iter()
            .for_each(|value| state.toggle_experience(&value));

            multi_select(ui, "Taille d'entreprise", &company_size_options, |value| {
                state.controls.company_size.contains(value)
            })
            .into_iter()
            .for_each(|value| state.toggle_company_size(&value));
            ui.separator();

            let mut show = state.controls.show_preview;
            if ui.checkbox(&mut show, "Afficher un aperçu des données").changed() {
                state.set_show_preview(show);
            }
        });
}

/// A collapsible list of checkboxes. Returns the values whose box was clicked.
fn multi_select(
    ui: &mut Ui,
    title: &str,
    options: &[Value],
    is_selected: impl Fn(&Value) -> bool,
) -> Vec<Value> {
    let mut toggled = Vec::new();
    let n_selected = options.iter().filter(|v| is_selected(v)).count();
    egui::CollapsingHeader::new(RichText::new(format!("{title}  ({n_selected}/{})", options.len())).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for value in options {
                let mut checked = is_selected(value);
                if ui.checkbox(&mut checked, value.to_string()).changed() {
                    toggled.push(value.clone());
                }
            }
        });
    toggled
}

// ---------------------------------------------------------------------------
// Central panel – dashboard sections
// ---------------------------------------------------------------------------

/// Render every dashboard section, top to bottom.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(TITLE);
            ui.separator();
            match &state.dashboard {
                Dashboard::Unavailable { message } => {
                    if let Some(error) = &state.status_message {
                        ui.label(RichText::new(error).color(Color32::RED));
                    }
                    ui.label(message);
                }
                Dashboard::Ready(view) => sections(ui, view),
            }
        });
}

fn sections(ui: &mut Ui, view: &DashboardView) {
    // ---- Key figures ----
    ui.columns(3, |columns: &mut [Ui]| {
        kpi(
            &mut columns[0],
            "💰 Salaire Moyen",
            Metrics::format_amount(view.metrics.mean_salary),
        );
        kpi(
            &mut columns[1],
            "🏠 Moyenne Télétravail",
            Metrics::format_amount(view.metrics.remote_mean_salary),
        );
        kpi(&mut columns[2], "🔎 Données Manquantes", view.metrics.missing_label());
    });
    ui.separator();

    if let Some(preview) = &view.preview {
        ui.strong("Aperçu des données");
        tables::data_table(ui, "preview", preview, 240.0);
        ui.add_space(8.0);
    }

    ui.strong("Statistiques descriptives");
    tables::data_table(ui, "summary", &view.summary, 260.0);
    ui.separator();

    match &view.country_box {
        Some(spec) => plot::chart(ui, spec),
        None => {
            ui.label(RichText::new(view.country_warning()).color(Color32::YELLOW));
        }
    }
    ui.separator();

    plot::chart(ui, &view.category_bar);
    ui.separator();
    plot::chart(ui, &view.correlation_heatmap);
    ui.separator();
    plot::chart(ui, &view.title_evolution);
    ui.separator();
    plot::chart(ui, &view.median_by_size);
    ui.separator();
    plot::chart(ui, &view.remote_strip);
    ui.separator();

    ui.strong(format!("Nombre de résultats trouvés : {}", view.targeted.len()));
    tables::data_table(ui, "targeted", &view.targeted, 300.0);
    ui.separator();

    plot::chart(ui, &view.top_locations);
    ui.separator();

    ui.strong("Salaire moyen par expérience et télétravail");
    tables::pivot_table(ui, "pivot", &view.pivot);
}

fn kpi(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Fichier", |ui: &mut Ui| {
            if ui.button("Ouvrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Recharger").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} · {} lignes",
            state.data_path.display(),
            state.table.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Ouvrir un fichier de salaires")
        .add_filter("Fichiers pris en charge", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("opening {}", path.display());
        state.open(path);
    }
}
