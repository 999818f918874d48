use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::Value;

/// How values are combined within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

/// One group of an aggregation: key values in `group_keys` order, and the
/// reduced metric. `value` is `None` when a mean has nothing to average.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub keys: Vec<Value>,
    pub value: Option<f64>,
}

impl AggregateRow {
    /// Display label of the group, keys joined with " / ".
    pub fn label(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Group the view by `group_keys` and reduce `metric` within each group.
///
/// Rows come back sorted by key. Records with a missing key are dropped and
/// records with a missing metric contribute nothing, but still make their
/// group appear. Unknown columns give an empty result.
pub fn aggregate(
    view: &FilteredView<'_>,
    group_keys: &[&str],
    metric: &str,
    reducer: Reducer,
) -> Vec<AggregateRow> {
    if !group_keys.iter().all(|k| view.has_column(k)) || !view.has_column(metric) {
        return Vec::new();
    }

    let mut groups: BTreeMap<Vec<Value>, Accumulator> = BTreeMap::new();
    for record in view.records() {
        let keys: Vec<Value> = group_keys.iter().map(|k| record.get(k).clone()).collect();
        if keys.iter().any(Value::is_null) {
            continue;
        }
        let acc = groups.entry(keys).or_default();
        if let Some(v) = record.number(metric) {
            acc.sum += v;
            acc.count += 1;
        }
    }

    groups
        .into_iter()
        .map(|(keys, acc)| {
            let value = match reducer {
                Reducer::Sum => Some(acc.sum),
                Reducer::Mean if acc.count > 0 => Some(acc.sum / acc.count as f64),
                Reducer::Mean => None,
            };
            AggregateRow { keys, value }
        })
        .collect()
}

/// The `n` rows with the largest defined values, largest first.
/// Ties keep key order.
pub fn top_n(rows: &[AggregateRow], n: usize) -> Vec<AggregateRow> {
    let mut ranked: Vec<&AggregateRow> = rows.iter().filter(|r| r.value.is_some()).collect();
    ranked.sort_by(|a, b| {
        let (va, vb) = (a.value.unwrap_or_default(), b.value.unwrap_or_default());
        vb.total_cmp(&va).then_with(|| a.keys.cmp(&b.keys))
    });
    ranked.into_iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{all_indices, apply_filters, DateRange, FilterSelection};
    use crate::data::model::tests::{dataset, date, text};
    use crate::data::model::{
        Dataset, CONVERSIONS, CONVERSION_RATE, DATE, LEADS, PRODUCT, REGION, SALES,
    };

    fn sample() -> Dataset {
        dataset(&[
            &[(REGION, text("East")), (SALES, Value::Number(100.0)), (DATE, date("2024-01-01"))],
            &[(REGION, text("West")), (SALES, Value::Number(50.0)), (DATE, date("2024-01-02"))],
            &[(REGION, text("East")), (SALES, Value::Number(30.0)), (DATE, date("2024-02-01"))],
        ])
    }

    fn row(key: &str, value: f64) -> AggregateRow {
        AggregateRow {
            keys: vec![text(key)],
            value: Some(value),
        }
    }

    #[test]
    fn sums_by_region_within_january() {
        let ds = sample();
        let selection = FilterSelection {
            date_range: Some(DateRange::new(
                date("2024-01-01").as_date().unwrap(),
                date("2024-01-31").as_date().unwrap(),
            )),
            ..Default::default()
        };
        let indices = apply_filters(&ds, &selection);
        let view = FilteredView::new(&ds, &indices);
        assert_eq!(view.len(), 2);

        let rows = aggregate(&view, &[REGION], SALES, Reducer::Sum);
        assert_eq!(rows, vec![row("East", 100.0), row("West", 50.0)]);
    }

    #[test]
    fn group_sums_add_up_to_the_total() {
        let ds = sample();
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let rows = aggregate(&view, &[REGION], SALES, Reducer::Sum);
        assert_eq!(rows.len(), 2);
        let total: f64 = rows.iter().filter_map(|r| r.value).sum();
        assert_eq!(total, view.numbers(SALES).iter().sum::<f64>());
    }

    #[test]
    fn two_keys_group_on_the_combination() {
        let ds = sample();
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let rows = aggregate(&view, &[DATE, REGION], SALES, Reducer::Sum);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].keys, vec![date("2024-01-01"), text("East")]);
        assert_eq!(rows[0].label(), "2024-01-01 / East");
    }

    #[test]
    fn mean_rate_skips_zero_lead_records() {
        let ds = dataset(&[
            &[(PRODUCT, text("A")), (LEADS, Value::Number(10.0)), (CONVERSIONS, Value::Number(2.0))],
            &[(PRODUCT, text("A")), (LEADS, Value::Number(0.0)), (CONVERSIONS, Value::Number(5.0))],
            &[(PRODUCT, text("B")), (LEADS, Value::Number(0.0)), (CONVERSIONS, Value::Number(5.0))],
        ]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let rows = aggregate(&view, &[PRODUCT], CONVERSION_RATE, Reducer::Mean);
        assert_eq!(
            rows,
            vec![
                AggregateRow { keys: vec![text("A")], value: Some(0.2) },
                AggregateRow { keys: vec![text("B")], value: None },
            ]
        );
    }

    #[test]
    fn empty_view_and_unknown_columns_give_empty_results() {
        let ds = sample();
        let view = FilteredView::new(&ds, &[]);
        assert!(aggregate(&view, &[REGION], SALES, Reducer::Sum).is_empty());
        assert!(aggregate(&view, &[REGION], SALES, Reducer::Mean).is_empty());

        let indices = all_indices(&ds);
        let full = FilteredView::new(&ds, &indices);
        assert!(aggregate(&full, &[PRODUCT], SALES, Reducer::Sum).is_empty());
        assert!(aggregate(&full, &[REGION], LEADS, Reducer::Sum).is_empty());
    }

    #[test]
    fn top_n_ranks_descending() {
        let rows = vec![row("A", 5.0), row("B", 9.0), row("C", 5.0), row("D", 1.0)];
        let top = top_n(&rows, 3);
        assert_eq!(top, vec![row("B", 9.0), row("A", 5.0), row("C", 5.0)]);
        assert!(top_n(&[], 5).is_empty());
    }
}
