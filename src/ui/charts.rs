use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, pos2, vec2, Color32, Pos2, Sense, Shape, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, Points,
};

use crate::color::{generate_palette, ColorMap};
use crate::dashboard::{x_to_date, BarSeries, PanelData, Series};
use crate::data::aggregate::AggregateRow;
use crate::data::stats::{BoxSummary, CorrelationMatrix, HistogramBin, ScatterPoint};
use crate::ui::table::format_number;

const PLOT_HEIGHT: f32 = 260.0;

/// Render one dashboard panel, or its empty state.
pub fn panel(ui: &mut Ui, data: &PanelData) {
    if data.is_empty() {
        ui.label(egui::RichText::new("No data for the current filters.").weak());
        return;
    }
    match data {
        PanelData::DateLines(series) => date_lines(ui, series),
        PanelData::Bars { categories, series } => bars(ui, categories, series),
        PanelData::Histogram(bins) => histogram(ui, bins),
        PanelData::Scatter {
            x_label,
            y_label,
            points,
        } => scatter(ui, x_label, y_label, points),
        PanelData::Pie(slices) => pie(ui, slices),
        PanelData::BoxPlot(boxes) => box_plot(ui, boxes),
        PanelData::Correlation(matrix) => correlation_table(ui, matrix),
        PanelData::Ranking { key, metric, rows } => ranking_table(ui, key, metric, rows),
    }
}

fn date_label(mark: GridMark, _range: &std::ops::RangeInclusive<f64>) -> String {
    x_to_date(mark.value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Label integer marks with the category at that position.
fn category_formatter(
    categories: &[String],
) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String + 'static {
    let categories = categories.to_vec();
    move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Plots
// ---------------------------------------------------------------------------

fn date_lines(ui: &mut Ui, series: &[Series]) {
    let colors = generate_palette(series.len());
    Plot::new("date_lines")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(date_label)
        .show(ui, |plot_ui| {
            for (s, color) in series.iter().zip(colors) {
                let line = Line::new(s.points.clone())
                    .name(&s.name)
                    .color(color)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

fn bars(ui: &mut Ui, categories: &[String], series: &[BarSeries]) {
    let colors = generate_palette(series.len());
    let group_width = 0.8;
    let bar_width = group_width / series.len() as f64;

    Plot::new("bars")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_formatter(categories))
        .show(ui, |plot_ui| {
            for (i, (s, color)) in series.iter().zip(colors).enumerate() {
                let offset = -group_width / 2.0 + bar_width * (i as f64 + 0.5);
                let bars: Vec<Bar> = s
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(x, v)| {
                        let v = (*v)?;
                        Some(
                            Bar::new(x as f64 + offset, v)
                                .width(bar_width)
                                .name(&categories[x]),
                        )
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(&s.name).color(color));
            }
        });
}

fn histogram(ui: &mut Ui, bins: &[HistogramBin]) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{} – {}", format_number(b.start), format_number(b.end)))
        })
        .collect();
    Plot::new("histogram")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("count").color(Color32::LIGHT_BLUE));
        });
}

fn scatter(ui: &mut Ui, x_label: &str, y_label: &str, points: &[ScatterPoint]) {
    let color_map = ColorMap::new(points.iter().filter_map(|p| p.category.as_ref()));
    let max_size = points
        .iter()
        .filter_map(|p| p.size)
        .fold(0.0_f64, f64::max);

    Plot::new("scatter")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for p in points {
                let (name, color) = match &p.category {
                    Some(c) if !c.is_null() => (c.to_string(), color_map.color_for(c)),
                    _ => (String::from("(missing)"), Color32::GRAY),
                };
                let radius = match p.size {
                    Some(s) if max_size > 0.0 && s > 0.0 => {
                        2.0 + 8.0 * (s / max_size).sqrt() as f32
                    }
                    _ => 3.0,
                };
                plot_ui.points(
                    Points::new(vec![[p.x, p.y]])
                        .name(name)
                        .color(color)
                        .radius(radius),
                );
            }
        });
}

fn box_plot(ui: &mut Ui, boxes: &[BoxSummary]) {
    let categories: Vec<String> = boxes.iter().map(|b| b.key.to_string()).collect();
    let colors = generate_palette(boxes.len());
    Plot::new("box_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_formatter(&categories))
        .show(ui, |plot_ui| {
            for (i, (b, color)) in boxes.iter().zip(colors).enumerate() {
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max),
                )
                .name(&categories[i])
                .box_width(0.5)
                .fill(color.linear_multiply(0.3))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&categories[i]).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Pie chart (painted by hand, egui_plot has none)
// ---------------------------------------------------------------------------

fn pie(ui: &mut Ui, slices: &[(String, f64)]) {
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    let colors = generate_palette(slices.len());

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) =
            ui.allocate_painter(vec2(PLOT_HEIGHT, PLOT_HEIGHT), Sense::hover());
        let center = response.rect.center();
        let radius = PLOT_HEIGHT / 2.0 - 8.0;

        let mut angle = -FRAC_PI_2;
        for ((_, value), color) in slices.iter().zip(&colors) {
            let sweep = (value / total) as f32 * TAU;
            for shape in sector(center, radius, angle, sweep, *color) {
                painter.add(shape);
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for ((label, value), color) in slices.iter().zip(&colors) {
                let share = value / total * 100.0;
                ui.colored_label(
                    *color,
                    format!("{label}: {} ({share:.1}%)", format_number(*value)),
                );
            }
        });
    });
}

/// A circular sector as convex pieces of at most a quarter turn.
fn sector(center: Pos2, radius: f32, start: f32, sweep: f32, color: Color32) -> Vec<Shape> {
    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f32;
    (0..pieces)
        .map(|i| {
            let a0 = start + step * i as f32;
            let mut points = vec![center];
            for k in 0..=16 {
                let a = a0 + step * k as f32 / 16.0;
                points.push(pos2(center.x + radius * a.cos(), center.y + radius * a.sin()));
            }
            Shape::convex_polygon(points, color, Stroke::NONE)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn correlation_table(ui: &mut Ui, matrix: &CorrelationMatrix) {
    egui::Grid::new("correlation")
        .striped(true)
        .num_columns(matrix.columns.len() + 1)
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for col in &matrix.columns {
                ui.strong(col);
            }
            ui.end_row();

            for row in &matrix.columns {
                ui.strong(row);
                for col in &matrix.columns {
                    match matrix.get(row, col) {
                        Some(r) => ui.label(format!("{r:.2}")),
                        None => ui.weak("n/a"),
                    };
                }
                ui.end_row();
            }
        });
}

fn ranking_table(ui: &mut Ui, key: &str, metric: &str, rows: &[AggregateRow]) {
    egui::Grid::new("ranking")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            ui.strong("#");
            ui.strong(key);
            ui.strong(metric);
            ui.end_row();

            for (rank, row) in rows.iter().enumerate() {
                ui.label((rank + 1).to_string());
                ui.label(row.label());
                ui.label(row.value.map(format_number).unwrap_or_default());
                ui.end_row();
            }
        });
}
