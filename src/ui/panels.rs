use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::dashboard::Tab;
use crate::data::filter::{filter_options, DateRange};
use crate::data::model::{Value, DATE, FILTER_COLUMNS};
use crate::state::AppState;
use crate::ui::{charts, table};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let options: Vec<(&str, Vec<Value>)> = FILTER_COLUMNS
        .iter()
        .map(|col| (*col, filter_options(dataset, col).into_iter().collect()))
        .filter(|(_, vals): &(&str, Vec<Value>)| !vals.is_empty())
        .collect();
    let date_span = dataset.date_span(DATE);
    let has_date = dataset.has_column(DATE);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-column multi-selects (collapsible) ----
            for (col, all_values) in &options {
                let n_selected = state
                    .selection
                    .allowed
                    .get(*col)
                    .map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .selection
                                .allowed
                                .get(*col)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }

            if has_date {
                ui.separator();
                date_filter(ui, state, date_span);
            }
        });
}

fn date_filter(
    ui: &mut Ui,
    state: &mut AppState,
    span: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
) {
    ui.strong("Date Range");
    let Some((min, max)) = span else {
        ui.label("No valid dates in the data.");
        return;
    };

    let mut enabled = state.selection.date_range.is_some();
    if ui.checkbox(&mut enabled, "Filter by date").changed() {
        state.set_date_filter_enabled(enabled);
    }

    let Some(range) = state.selection.date_range else {
        ui.label(format!("All dates ({min} – {max})"));
        return;
    };

    let (mut start, mut end) = (range.start, range.end);
    egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("From");
        ui.add(egui_extras::DatePickerButton::new(&mut start).id_salt("date_start"));
        ui.end_row();
        ui.label("To");
        ui.add(egui_extras::DatePickerButton::new(&mut end).id_salt("date_end"));
        ui.end_row();
    });
    if start > end {
        ui.label(RichText::new("Start date is after end date.").color(Color32::YELLOW));
    }
    if ui.small_button("Full span").clicked() {
        (start, end) = (min, max);
    }
    state.set_date_range(DateRange::new(start, end));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} match the filters",
                ds.len(),
                state.visible_indices.len()
            ));
            ui.separator();
            ui.toggle_value(&mut state.show_raw_preview, "Show raw data");
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – tabs and data table
// ---------------------------------------------------------------------------

/// Render the dashboard: raw preview, tab bar, the active tab's panels and
/// the filtered data table.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a CSV file to view the dashboard  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Sales and Marketing Insights Dashboard");
            ui.label(
                "An end-to-end view of the sales pipeline, from customer acquisition to \
                 conversion. Use the sidebar filters to customize the analysis.",
            );

            if state.show_raw_preview {
                ui.add_space(6.0);
                ui.strong("Raw data preview");
                let preview = state.preview_indices();
                if let Some(ds) = &state.dataset {
                    table::records_table(ui, "raw_preview", ds, &preview);
                }
            }

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                for tab in Tab::ALL {
                    if ui
                        .selectable_label(state.active_tab == tab, tab.label())
                        .clicked()
                    {
                        state.set_tab(tab);
                    }
                }
            });
            ui.separator();

            ui.heading(state.active_tab.heading());
            if state.panels.is_empty() {
                ui.label("None of the columns this tab needs are in the data.");
            }
            for (panel, data) in &state.panels {
                ui.add_space(6.0);
                ui.strong(panel.title());
                ui.push_id(panel.title(), |ui: &mut Ui| charts::panel(ui, data));
            }

            ui.add_space(12.0);
            ui.heading("Data Table of Filtered Results");
            if let Some(view) = state.view() {
                if view.is_empty() {
                    ui.label("No rows match the current filters.");
                } else {
                    ui.label(format!("{} rows", view.len()));
                }
                table::records_table(ui, "filtered_table", view.dataset(), view.indices());
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load_or_report(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .add_filter("CSV", &["csv"])
        .set_file_name("filtered.csv")
        .save_file();

    if let Some(path) = file {
        match state.export_view(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
