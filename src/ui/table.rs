use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{Dataset, Value};

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

/// Compact display of a number: integers without decimals, others with at
/// most four.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Number(v) => format_number(*v),
        other => other.to_string(),
    }
}

/// Render the rows `indices` of `dataset` with every column.
pub fn records_table(ui: &mut Ui, id: &str, dataset: &Dataset, indices: &[usize]) {
    let columns = &dataset.column_names;
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(MAX_TABLE_HEIGHT)
                .columns(Column::auto().at_least(60.0).resizable(true), columns.len())
                .header(ROW_HEIGHT + 2.0, |mut header| {
                    for col in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(col);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, indices.len(), |mut row| {
                        let record = &dataset.records[indices[row.index()]];
                        for col in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(format_cell(record.get(col)));
                            });
                        }
                    });
                });
        });
    });
}
