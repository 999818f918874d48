//! Dashboard panels: which charts exist, when they are shown, and the
//! rendering-independent data each one draws.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::DashboardConfig;
use crate::data::aggregate::{aggregate, top_n, AggregateRow, Reducer};
use crate::data::filter::FilteredView;
use crate::data::model::{
    Dataset, Value, CHANNEL, CONVERSIONS, CONVERSION_RATE, CUSTOMER_SEGMENT, DATE, LEADS,
    MARKETING_SPEND, MONTH, PRODUCT, REGION, SALES,
};
use crate::data::stats::{
    box_summary, correlation_matrix, histogram, scatter_points, BoxSummary, CorrelationMatrix,
    HistogramBin, ScatterPoint,
};

/// Numeric columns considered for the correlation matrix.
pub const CORRELATION_COLUMNS: [&str; 5] =
    [SALES, LEADS, CONVERSIONS, MARKETING_SPEND, CONVERSION_RATE];

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Overview,
    ProductAnalysis,
    RegionalInsights,
    AdvancedMetrics,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Overview,
        Tab::ProductAnalysis,
        Tab::RegionalInsights,
        Tab::AdvancedMetrics,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::ProductAnalysis => "Product Analysis",
            Tab::RegionalInsights => "Regional Insights",
            Tab::AdvancedMetrics => "Advanced Metrics",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Tab::Overview => "Overall Sales Trends",
            Tab::ProductAnalysis => "Product Performance",
            Tab::RegionalInsights => "Regional Performance",
            Tab::AdvancedMetrics => "Advanced Metrics",
        }
    }
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    SalesOverTime,
    MonthlySales,
    LeadsVsConversionsByChannel,
    SalesDistribution,
    SalesByProduct,
    AvgConversionsByProduct,
    ConversionRateByProduct,
    SpendVsSales,
    TopProducts,
    SalesByRegion,
    SalesTrendByRegion,
    SalesSpreadByChannel,
    SalesVsLeads,
    SalesVsConversions,
    SalesBySegment,
    Correlation,
}

impl Panel {
    pub const ALL: [Panel; 16] = [
        Panel::SalesOverTime,
        Panel::MonthlySales,
        Panel::LeadsVsConversionsByChannel,
        Panel::SalesDistribution,
        Panel::SalesByProduct,
        Panel::AvgConversionsByProduct,
        Panel::ConversionRateByProduct,
        Panel::SpendVsSales,
        Panel::TopProducts,
        Panel::SalesByRegion,
        Panel::SalesTrendByRegion,
        Panel::SalesSpreadByChannel,
        Panel::SalesVsLeads,
        Panel::SalesVsConversions,
        Panel::SalesBySegment,
        Panel::Correlation,
    ];

    pub fn tab(self) -> Tab {
        use Panel::*;
        match self {
            SalesOverTime | MonthlySales | LeadsVsConversionsByChannel | SalesDistribution => {
                Tab::Overview
            }
            SalesByProduct | AvgConversionsByProduct | ConversionRateByProduct | SpendVsSales
            | TopProducts => Tab::ProductAnalysis,
            SalesByRegion | SalesTrendByRegion | SalesSpreadByChannel => Tab::RegionalInsights,
            SalesVsLeads | SalesVsConversions | SalesBySegment | Correlation => {
                Tab::AdvancedMetrics
            }
        }
    }

    pub fn title(self) -> &'static str {
        use Panel::*;
        match self {
            SalesOverTime => "Sales Over Time",
            MonthlySales => "Monthly Sales",
            LeadsVsConversionsByChannel => "Leads vs Conversions per Channel",
            SalesDistribution => "Sales Distribution",
            SalesByProduct => "Total Sales by Product",
            AvgConversionsByProduct => "Average Conversions per Product",
            ConversionRateByProduct => "Conversion Rate per Product",
            SpendVsSales => "Marketing Spend vs Sales",
            TopProducts => "Top Products by Sales",
            SalesByRegion => "Sales by Region",
            SalesTrendByRegion => "Sales Trend per Region",
            SalesSpreadByChannel => "Sales Spread per Channel",
            SalesVsLeads => "Sales vs Leads",
            SalesVsConversions => "Sales vs Conversions",
            SalesBySegment => "Sales per Customer Segment",
            Correlation => "Correlation Matrix",
        }
    }

    /// Columns the dataset must have for the panel to be shown.
    pub fn required_columns(self) -> &'static [&'static str] {
        use Panel::*;
        match self {
            SalesOverTime => &[DATE, SALES],
            MonthlySales => &[MONTH, SALES],
            LeadsVsConversionsByChannel => &[CHANNEL, LEADS, CONVERSIONS],
            SalesDistribution => &[SALES],
            SalesByProduct | TopProducts => &[PRODUCT, SALES],
            AvgConversionsByProduct => &[PRODUCT, CONVERSIONS],
            ConversionRateByProduct => &[PRODUCT, CONVERSION_RATE],
            SpendVsSales => &[MARKETING_SPEND, SALES, PRODUCT],
            SalesByRegion => &[REGION, SALES],
            SalesTrendByRegion => &[DATE, REGION, SALES],
            SalesSpreadByChannel => &[CHANNEL, SALES],
            SalesVsLeads => &[LEADS, SALES, REGION],
            SalesVsConversions => &[CONVERSIONS, SALES, REGION],
            SalesBySegment => &[CUSTOMER_SEGMENT, SALES],
            Correlation => &[],
        }
    }

    pub fn is_available(self, dataset: &Dataset) -> bool {
        match self {
            Panel::Correlation => correlation_columns(dataset).len() >= 2,
            _ => dataset.has_columns(self.required_columns()),
        }
    }

    /// Panels of `tab` the dataset can show, in display order.
    pub fn available_in(tab: Tab, dataset: &Dataset) -> Vec<Panel> {
        Panel::ALL
            .into_iter()
            .filter(|p| p.tab() == tab && p.is_available(dataset))
            .collect()
    }

    pub fn compute(self, view: &FilteredView<'_>, config: &DashboardConfig) -> PanelData {
        use Panel::*;
        match self {
            SalesOverTime => {
                let rows = aggregate(view, &[DATE], SALES, Reducer::Sum);
                PanelData::DateLines(vec![date_series(SALES, &rows)])
            }
            SalesTrendByRegion => {
                let rows = aggregate(view, &[DATE, REGION], SALES, Reducer::Sum);
                let mut by_region: BTreeMap<String, Vec<AggregateRow>> = BTreeMap::new();
                for row in rows {
                    let region = row.keys[1].to_string();
                    by_region.entry(region).or_default().push(row);
                }
                PanelData::DateLines(
                    by_region
                        .into_iter()
                        .map(|(region, rows)| date_series(&region, &rows))
                        .collect(),
                )
            }
            MonthlySales => bars(view, MONTH, &[SALES], Reducer::Sum),
            LeadsVsConversionsByChannel => {
                bars(view, CHANNEL, &[LEADS, CONVERSIONS], Reducer::Sum)
            }
            SalesByProduct => bars(view, PRODUCT, &[SALES], Reducer::Sum),
            AvgConversionsByProduct => bars(view, PRODUCT, &[CONVERSIONS], Reducer::Mean),
            ConversionRateByProduct => bars(view, PRODUCT, &[CONVERSION_RATE], Reducer::Mean),
            SalesBySegment => bars(view, CUSTOMER_SEGMENT, &[SALES], Reducer::Sum),
            SalesDistribution => {
                PanelData::Histogram(histogram(view, SALES, config.histogram_bins))
            }
            SpendVsSales => {
                let size = view.has_column(CONVERSIONS).then_some(CONVERSIONS);
                scatter(view, MARKETING_SPEND, SALES, PRODUCT, size)
            }
            SalesVsLeads => scatter(view, LEADS, SALES, REGION, None),
            SalesVsConversions => scatter(view, CONVERSIONS, SALES, REGION, None),
            TopProducts => {
                let rows = aggregate(view, &[PRODUCT], SALES, Reducer::Sum);
                PanelData::Ranking {
                    key: PRODUCT,
                    metric: SALES,
                    rows: top_n(&rows, config.top_n),
                }
            }
            SalesByRegion => {
                let slices = aggregate(view, &[REGION], SALES, Reducer::Sum)
                    .into_iter()
                    .filter_map(|row| {
                        let value = row.value.filter(|v| *v > 0.0)?;
                        Some((row.label(), value))
                    })
                    .collect();
                PanelData::Pie(slices)
            }
            SalesSpreadByChannel => PanelData::BoxPlot(box_summary(view, CHANNEL, SALES)),
            Correlation => {
                let columns = correlation_columns(view.dataset());
                PanelData::Correlation(correlation_matrix(view, &columns))
            }
        }
    }
}

fn correlation_columns(dataset: &Dataset) -> Vec<&'static str> {
    CORRELATION_COLUMNS
        .into_iter()
        .filter(|c| dataset.has_column(c))
        .collect()
}

// ---------------------------------------------------------------------------
// Panel data
// ---------------------------------------------------------------------------

/// A named polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

/// One metric across the categories of a bar chart; `None` is a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelData {
    /// Lines over a date axis; x is days since the common era.
    DateLines(Vec<Series>),
    Bars {
        categories: Vec<String>,
        series: Vec<BarSeries>,
    },
    Histogram(Vec<HistogramBin>),
    Scatter {
        x_label: &'static str,
        y_label: &'static str,
        points: Vec<ScatterPoint>,
    },
    Pie(Vec<(String, f64)>),
    BoxPlot(Vec<BoxSummary>),
    Correlation(CorrelationMatrix),
    Ranking {
        key: &'static str,
        metric: &'static str,
        rows: Vec<AggregateRow>,
    },
}

impl PanelData {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            PanelData::DateLines(series) => series.iter().all(|s| s.points.is_empty()),
            PanelData::Bars { categories, .. } => categories.is_empty(),
            PanelData::Histogram(bins) => bins.is_empty(),
            PanelData::Scatter { points, .. } => points.is_empty(),
            PanelData::Pie(slices) => slices.is_empty(),
            PanelData::BoxPlot(boxes) => boxes.is_empty(),
            PanelData::Correlation(m) => m.values.iter().flatten().all(Option::is_none),
            PanelData::Ranking { rows, .. } => rows.is_empty(),
        }
    }
}

/// Plot x coordinate of a date.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Inverse of [`date_to_x`], rounding to the nearest day.
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    let days = x.round();
    if !(i32::MIN as f64..=i32::MAX as f64).contains(&days) {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(days as i32)
}

fn date_series(name: &str, rows: &[AggregateRow]) -> Series {
    let points = rows
        .iter()
        .filter_map(|row| {
            let date = row.keys.first().and_then(Value::as_date)?;
            Some([date_to_x(date), row.value?])
        })
        .collect();
    Series {
        name: name.to_string(),
        points,
    }
}

/// Grouped bars: one series per metric, aligned on the union of groups.
fn bars(view: &FilteredView<'_>, key: &str, metrics: &[&str], reducer: Reducer) -> PanelData {
    let per_metric: Vec<BTreeMap<Value, Option<f64>>> = metrics
        .iter()
        .map(|m| {
            aggregate(view, &[key], m, reducer)
                .into_iter()
                .map(|row| (row.keys[0].clone(), row.value))
                .collect()
        })
        .collect();

    let mut keys: Vec<&Value> = per_metric.iter().flat_map(|m| m.keys()).collect();
    keys.sort();
    keys.dedup();

    let series = metrics
        .iter()
        .zip(&per_metric)
        .map(|(name, values)| BarSeries {
            name: name.to_string(),
            values: keys
                .iter()
                .map(|k| values.get(*k).copied().flatten())
                .collect(),
        })
        .collect();

    PanelData::Bars {
        categories: keys.iter().map(|k| k.to_string()).collect(),
        series,
    }
}

fn scatter(
    view: &FilteredView<'_>,
    x: &'static str,
    y: &'static str,
    color: &str,
    size: Option<&str>,
) -> PanelData {
    PanelData::Scatter {
        x_label: x,
        y_label: y,
        points: scatter_points(view, x, y, Some(color), size),
    }
}
