use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::Value;

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Symmetric Pearson correlation matrix over `columns`.
/// Entries are `None` where the correlation is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pairwise-complete Pearson correlation between every pair of `columns`.
pub fn correlation_matrix(view: &FilteredView<'_>, columns: &[&str]) -> CorrelationMatrix {
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = view
                .records()
                .filter_map(|r| Some((r.number(columns[i])?, r.number(columns[j])?)))
                .collect();
            let r = pearson(&pairs);
            // Exactly one on the diagonal whenever it is defined.
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    }
}

/// Pearson coefficient; `None` for fewer than two pairs or zero variance.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bins spanning the defined values of `column`. The last bin
/// is closed on the right so the maximum is counted.
pub fn histogram(view: &FilteredView<'_>, column: &str, bins: usize) -> Vec<HistogramBin> {
    let values = view.numbers(column);
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: values.len(),
        }];
    }

    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box summary
// ---------------------------------------------------------------------------

/// Five-number summary of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub key: Value,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Per-group five-number summary of `metric`, sorted by group key.
pub fn box_summary(view: &FilteredView<'_>, group_key: &str, metric: &str) -> Vec<BoxSummary> {
    let mut groups: BTreeMap<Value, Vec<f64>> = BTreeMap::new();
    for record in view.records() {
        let key = record.get(group_key);
        if key.is_null() {
            continue;
        }
        if let Some(v) = record.number(metric) {
            groups.entry(key.clone()).or_default().push(v);
        }
    }

    groups
        .into_iter()
        .map(|(key, mut values)| {
            values.sort_by(f64::total_cmp);
            BoxSummary {
                key,
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// Linear-interpolation quantile of non-empty sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub category: Option<Value>,
    pub size: Option<f64>,
}

/// Points where both `x` and `y` are defined, tagged with the optional
/// colour category and size value.
pub fn scatter_points(
    view: &FilteredView<'_>,
    x: &str,
    y: &str,
    color: Option<&str>,
    size: Option<&str>,
) -> Vec<ScatterPoint> {
    view.records()
        .filter_map(|r| {
            Some(ScatterPoint {
                x: r.number(x)?,
                y: r.number(y)?,
                category: color.map(|c| r.get(c).clone()),
                size: size.and_then(|s| r.number(s)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::all_indices;
    use crate::data::model::tests::{dataset, text};
    use crate::data::model::{Dataset, CHANNEL, LEADS, MARKETING_SPEND, REGION, SALES};

    fn numbers(rows: &[(f64, f64, f64)]) -> Dataset {
        let rows: Vec<Vec<(&str, Value)>> = rows
            .iter()
            .map(|&(s, l, m)| {
                vec![
                    (SALES, Value::Number(s)),
                    (LEADS, Value::Number(l)),
                    (MARKETING_SPEND, Value::Number(m)),
                ]
            })
            .collect();
        let refs: Vec<&[(&str, Value)]> = rows.iter().map(Vec::as_slice).collect();
        dataset(&refs)
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let ds = numbers(&[(1.0, 2.0, 5.0), (2.0, 4.1, 5.0), (3.0, 5.9, 5.0), (4.0, 1.0, 5.0)]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let cols = [SALES, LEADS, MARKETING_SPEND];
        let m = correlation_matrix(&view, &cols);

        for a in cols {
            for b in cols {
                assert_eq!(m.get(a, b), m.get(b, a));
            }
        }
        assert_eq!(m.get(SALES, SALES), Some(1.0));
        assert_eq!(m.get(LEADS, LEADS), Some(1.0));
        // Constant column: undefined everywhere, including its diagonal.
        assert_eq!(m.get(MARKETING_SPEND, MARKETING_SPEND), None);
        assert_eq!(m.get(SALES, MARKETING_SPEND), None);
    }

    #[test]
    fn perfectly_linear_columns_correlate_fully() {
        let ds = numbers(&[(1.0, -2.0, 0.0), (2.0, -4.0, 1.0), (3.0, -6.0, 2.0)]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let m = correlation_matrix(&view, &[SALES, LEADS, MARKETING_SPEND]);
        assert!((m.get(SALES, LEADS).unwrap() + 1.0).abs() < 1e-12);
        assert!((m.get(SALES, MARKETING_SPEND).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_empty_view_is_undefined() {
        let ds = numbers(&[(1.0, 2.0, 3.0)]);
        let view = FilteredView::new(&ds, &[]);
        let m = correlation_matrix(&view, &[SALES, LEADS]);
        assert_eq!(m.values, vec![vec![None, None], vec![None, None]]);
    }

    #[test]
    fn histogram_counts_every_value() {
        let ds = numbers(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.5, 0.0, 0.0), (10.0, 0.0, 0.0)]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let bins = histogram(&view, SALES, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![2, 1, 0, 1]);
        assert_eq!(bins[3].end, 10.0);

        let constant = histogram(&view, LEADS, 30);
        assert_eq!(constant.len(), 1);
        assert_eq!(constant[0].count, 4);
        assert_eq!(constant[0].width(), 1.0);

        assert!(histogram(&FilteredView::new(&ds, &[]), SALES, 30).is_empty());
    }

    #[test]
    fn box_summary_interpolates_quartiles() {
        let ds = dataset(&[
            &[(CHANNEL, text("Web")), (SALES, Value::Number(1.0))],
            &[(CHANNEL, text("Web")), (SALES, Value::Number(2.0))],
            &[(CHANNEL, text("Web")), (SALES, Value::Number(3.0))],
            &[(CHANNEL, text("Web")), (SALES, Value::Number(4.0))],
            &[(CHANNEL, text("Store")), (SALES, Value::Number(7.0))],
            &[(CHANNEL, Value::Null), (SALES, Value::Number(100.0))],
        ]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let boxes = box_summary(&view, CHANNEL, SALES);
        assert_eq!(boxes.len(), 2);

        assert_eq!(boxes[0].key, text("Store"));
        assert_eq!((boxes[0].min, boxes[0].median, boxes[0].max), (7.0, 7.0, 7.0));

        let web = &boxes[1];
        assert_eq!((web.min, web.q1, web.median, web.q3, web.max), (1.0, 1.75, 2.5, 3.25, 4.0));
    }

    #[test]
    fn scatter_keeps_points_with_both_coordinates() {
        let ds = dataset(&[
            &[(LEADS, Value::Number(1.0)), (SALES, Value::Number(2.0)), (REGION, text("N"))],
            &[(LEADS, Value::Null), (SALES, Value::Number(3.0)), (REGION, text("S"))],
        ]);
        let indices = all_indices(&ds);
        let view = FilteredView::new(&ds, &indices);
        let points = scatter_points(&view, LEADS, SALES, Some(REGION), None);
        assert_eq!(
            points,
            vec![ScatterPoint { x: 1.0, y: 2.0, category: Some(text("N")), size: None }]
        );
    }
}
