use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{Dataset, Record, Value, DATE, FILTER_COLUMNS};
use crate::config::DateRangeDefault;

// ---------------------------------------------------------------------------
// Filter selection: allowed values per column plus a date interval
// ---------------------------------------------------------------------------

/// Closed date interval; both endpoints are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The active filter state.
///
/// A column listed in `allowed` only lets through records whose value is in
/// its set, so an empty set hides every record. Columns without an entry,
/// or absent from the dataset, are not constrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub allowed: BTreeMap<String, BTreeSet<Value>>,
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    /// Everything selected: all distinct values for each filter column the
    /// dataset has, and the date interval chosen by `date_default`.
    ///
    /// A column whose cells are all missing gets no control and no entry.
    pub fn defaults(dataset: &Dataset, date_default: DateRangeDefault) -> Self {
        let allowed = FILTER_COLUMNS
            .iter()
            .map(|col| (col.to_string(), filter_options(dataset, col)))
            .filter(|(_, options)| !options.is_empty())
            .collect();

        let date_range = match date_default {
            DateRangeDefault::FullSpan => dataset
                .date_span(DATE)
                .map(|(start, end)| DateRange::new(start, end)),
            DateRangeDefault::Unset => None,
        };

        FilterSelection {
            allowed,
            date_range,
        }
    }

    /// Whether `record` passes every predicate that applies to `dataset`.
    pub fn matches(&self, dataset: &Dataset, record: &Record) -> bool {
        for (col, selected) in &self.allowed {
            if !dataset.has_column(col) {
                continue;
            }
            if !selected.contains(record.get(col)) {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            if dataset.has_column(DATE) {
                match record.date(DATE) {
                    Some(d) if range.contains(d) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

/// Distinct non-missing values of `column`, sorted. Empty when the column
/// does not exist, in which case no control should be shown for it.
pub fn filter_options(dataset: &Dataset, column: &str) -> BTreeSet<Value> {
    dataset.distinct_values(column)
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The records of a dataset that passed a selection, in dataset order.
#[derive(Debug, Clone, Copy)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: &'a [usize],
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, indices: &'a [usize]) -> Self {
        Self { dataset, indices }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + 'a {
        let dataset = self.dataset;
        let indices = self.indices;
        indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.dataset.has_column(column)
    }

    /// Defined numeric values of `column` across the view.
    pub fn numbers(&self, column: &str) -> Vec<f64> {
        self.records().filter_map(|r| r.number(column)).collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices of the records in this view that also pass `selection`.
    pub fn refine(&self, selection: &FilterSelection) -> Vec<usize> {
        self.indices
            .iter()
            .copied()
            .filter(|&i| selection.matches(self.dataset, &self.dataset.records[i]))
            .collect()
    }
}

/// Return indices of records that pass all active filters.
pub fn apply_filters(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(dataset, r))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of every record in `dataset`.
pub fn all_indices(dataset: &Dataset) -> Vec<usize> {
    (0..dataset.len()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{dataset, date, text};
    use crate::data::model::{CHANNEL, PRODUCT, REGION, SALES};

    fn ymd(s: &str) -> NaiveDate {
        date(s).as_date().unwrap()
    }

    fn sample() -> Dataset {
        dataset(&[
            &[(REGION, text("East")), (SALES, Value::Number(100.0)), (DATE, date("2024-01-01"))],
            &[(REGION, text("West")), (SALES, Value::Number(50.0)), (DATE, date("2024-01-02"))],
            &[(REGION, text("East")), (SALES, Value::Number(30.0)), (DATE, date("2024-02-01"))],
            &[(REGION, Value::Null), (SALES, Value::Number(5.0)), (DATE, Value::Null)],
        ])
    }

    #[test]
    fn defaults_select_everything_present() {
        let ds = sample();
        let sel = FilterSelection::defaults(&ds, DateRangeDefault::FullSpan);
        assert_eq!(sel.allowed.len(), 1);
        assert_eq!(sel.allowed[REGION].len(), 2);
        assert!(!sel.allowed.contains_key(PRODUCT));
        assert_eq!(
            sel.date_range,
            Some(DateRange::new(ymd("2024-01-01"), ymd("2024-02-01")))
        );

        let unset = FilterSelection::defaults(&ds, DateRangeDefault::Unset);
        assert_eq!(unset.date_range, None);
    }

    #[test]
    fn all_blank_filter_column_constrains_nothing() {
        let ds = dataset(&[
            &[(REGION, text("East")), (CHANNEL, Value::Null), (SALES, Value::Number(10.0))],
            &[(REGION, text("West")), (CHANNEL, Value::Null), (SALES, Value::Number(20.0))],
        ]);
        let sel = FilterSelection::defaults(&ds, DateRangeDefault::FullSpan);
        assert!(!sel.allowed.contains_key(CHANNEL));
        assert_eq!(apply_filters(&ds, &sel), vec![0, 1]);
    }

    #[test]
    fn unparseable_date_only_fails_the_date_predicate() {
        let ds = dataset(&[
            &[(REGION, text("East")), (DATE, date("2024-01-01"))],
            &[(REGION, text("East")), (DATE, Value::Null)],
            &[(REGION, text("West")), (DATE, Value::Null)],
        ]);
        let mut sel = FilterSelection::defaults(&ds, DateRangeDefault::Unset);
        sel.allowed.insert(REGION.to_string(), [text("East")].into());
        assert_eq!(apply_filters(&ds, &sel), vec![0, 1]);

        sel.date_range = Some(DateRange::new(ymd("2020-01-01"), ymd("2030-01-01")));
        assert_eq!(apply_filters(&ds, &sel), vec![0]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = sample();
        let mut sel = FilterSelection::defaults(&ds, DateRangeDefault::Unset);
        sel.date_range = Some(DateRange::new(ymd("2024-01-01"), ymd("2024-01-31")));
        assert_eq!(apply_filters(&ds, &sel), vec![0, 1]);

        sel.date_range = Some(DateRange::new(ymd("2024-01-02"), ymd("2024-02-01")));
        assert_eq!(apply_filters(&ds, &sel), vec![1, 2]);
    }

    #[test]
    fn missing_values_fail_active_predicates() {
        let ds = sample();
        let sel = FilterSelection::defaults(&ds, DateRangeDefault::Unset);
        // Null region is not among the distinct options.
        assert_eq!(apply_filters(&ds, &sel), vec![0, 1, 2]);

        let no_filters = FilterSelection::default();
        assert_eq!(apply_filters(&ds, &no_filters), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_allowed_set_excludes_all() {
        let ds = sample();
        let mut sel = FilterSelection::defaults(&ds, DateRangeDefault::FullSpan);
        sel.allowed.insert(REGION.to_string(), BTreeSet::new());
        assert!(apply_filters(&ds, &sel).is_empty());
    }

    #[test]
    fn absent_columns_impose_no_constraint() {
        let ds = dataset(&[&[(SALES, Value::Number(1.0))], &[(SALES, Value::Number(2.0))]]);
        let mut sel = FilterSelection::default();
        sel.allowed.insert(CHANNEL.to_string(), BTreeSet::new());
        sel.date_range = Some(DateRange::new(ymd("2030-01-01"), ymd("2030-01-02")));
        assert_eq!(apply_filters(&ds, &sel), vec![0, 1]);
        assert!(filter_options(&ds, CHANNEL).is_empty());
    }

    #[test]
    fn filtering_is_a_subset_and_idempotent() {
        let ds = sample();
        let mut sel = FilterSelection::defaults(&ds, DateRangeDefault::FullSpan);
        sel.allowed.insert(REGION.to_string(), [text("East")].into());

        let once = apply_filters(&ds, &sel);
        assert!(once.iter().all(|&i| i < ds.len()));
        assert_eq!(once, vec![0, 2]);

        let twice = FilteredView::new(&ds, &once).refine(&sel);
        assert_eq!(once, twice);
    }

    #[test]
    fn widening_never_shrinks_the_view() {
        let ds = sample();
        let mut narrow = FilterSelection::defaults(&ds, DateRangeDefault::Unset);
        narrow.allowed.insert(REGION.to_string(), [text("West")].into());
        narrow.date_range = Some(DateRange::new(ymd("2024-01-02"), ymd("2024-01-02")));

        let mut wide_values = narrow.clone();
        wide_values
            .allowed
            .insert(REGION.to_string(), [text("West"), text("East")].into());

        let mut wide_dates = narrow.clone();
        wide_dates.date_range = Some(DateRange::new(ymd("2023-01-01"), ymd("2025-01-01")));

        let base = apply_filters(&ds, &narrow);
        for wider in [wide_values, wide_dates] {
            let widened = apply_filters(&ds, &wider);
            assert!(base.iter().all(|i| widened.contains(i)));
        }
    }
}
