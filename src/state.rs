use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::dashboard::{Panel, PanelData, Tab};
use crate::data::filter::{
    all_indices, apply_filters, filter_options, DateRange, FilterSelection, FilteredView,
};
use crate::data::model::{Dataset, Value, DATE};
use crate::data::{export, loader};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Active filter selection.
    pub selection: FilterSelection,

    /// Indices of records passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Tab whose panels are computed.
    pub active_tab: Tab,

    /// Panels of the active tab with their data for the current view.
    pub panels: Vec<(Panel, PanelData)>,

    /// Whether the raw data preview is shown.
    pub show_raw_preview: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            active_tab: Tab::default(),
            panels: Vec::new(),
            show_raw_preview: false,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset the filters to their defaults.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.selection = FilterSelection::defaults(&dataset, self.config.date_range_default);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Load `path`, keeping the current dataset if it fails.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let dataset =
            loader::load_file(path).with_context(|| format!("loading {}", path.display()))?;
        log::info!(
            "Loaded {} records with columns {:?} from {}",
            dataset.len(),
            dataset.column_names,
            path.display()
        );
        if dataset.is_empty() {
            log::warn!("{} has a header but no records", path.display());
        }
        self.set_dataset(dataset);
        Ok(())
    }

    /// Load `path`, reporting failure in the status line.
    pub fn load_or_report(&mut self, path: &Path) {
        if let Err(e) = self.load_path(path) {
            log::error!("Failed to load file: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }

    /// The current filtered view, if a dataset is loaded.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.dataset
            .as_ref()
            .map(|ds| FilteredView::new(ds, &self.visible_indices))
    }

    /// Recompute `visible_indices` and the active tab's panels.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = apply_filters(ds, &self.selection);
            log::debug!(
                "{} of {} records pass the filters",
                self.visible_indices.len(),
                ds.len()
            );
        }
        self.recompute_panels();
    }

    fn recompute_panels(&mut self) {
        let panels = match self.view() {
            Some(view) => Panel::available_in(self.active_tab, view.dataset())
                .into_iter()
                .map(|p| (p, p.compute(&view, &self.config)))
                .collect(),
            None => Vec::new(),
        };
        self.panels = panels;
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.recompute_panels();
        }
    }

    /// Toggle a single value in a column's allowed set.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        let selected = self.selection.allowed.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            let all_vals = filter_options(ds, column);
            self.selection.allowed.insert(column.to_string(), all_vals);
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.selection
            .allowed
            .insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    /// Turn the date filter on (full span) or off.
    pub fn set_date_filter_enabled(&mut self, enabled: bool) {
        self.selection.date_range = if enabled {
            self.dataset
                .as_ref()
                .and_then(|ds| ds.date_span(DATE))
                .map(|(start, end)| DateRange::new(start, end))
        } else {
            None
        };
        self.refilter();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        if self.selection.date_range != Some(range) {
            self.selection.date_range = Some(range);
            self.refilter();
        }
    }

    /// Write the filtered records to `path`.
    pub fn export_view(&self, path: &Path) -> Result<()> {
        let view = self.view().context("no dataset loaded")?;
        export::export_file(&view, path)
            .with_context(|| format!("exporting to {}", path.display()))
    }

    /// Indices of every record, for the raw data preview.
    pub fn preview_indices(&self) -> Vec<usize> {
        self.dataset
            .as_ref()
            .map(|ds| {
                let mut all = all_indices(ds);
                all.truncate(self.config.preview_rows);
                all
            })
            .unwrap_or_default()
    }
}
