//! Data Panel Widget
//! Left side panel: dataset selection, load status and a preview of the
//! derived metrics.

use crate::data::DataLoader;
use crate::data::metrics::{
    COGS, DAY, GROSS_MARGIN, GROSS_PROFIT, NET_MARGIN, NET_PROFIT, SALE_VALUE,
};
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::*;
use std::path::PathBuf;

/// One preview line of the metrics table.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub day: String,
    pub value: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub gross_margin: f64,
    pub net_margin: f64,
}

impl PreviewRow {
    /// Build preview rows from the first `limit` rows of a metrics table.
    pub fn from_table(df: &DataFrame, limit: usize) -> PolarsResult<Vec<Self>> {
        let head = df.head(Some(limit));

        let days = head.column(DAY)?.cast(&DataType::String)?;
        let days: Vec<String> = days
            .str()?
            .into_iter()
            .map(|d| d.unwrap_or_default().to_string())
            .collect();

        let value = f64_values(&head, SALE_VALUE)?;
        let cogs = f64_values(&head, COGS)?;
        let gross_profit = f64_values(&head, GROSS_PROFIT)?;
        let net_profit = f64_values(&head, NET_PROFIT)?;
        let gross_margin = f64_values(&head, GROSS_MARGIN)?;
        let net_margin = f64_values(&head, NET_MARGIN)?;

        Ok(days
            .into_iter()
            .enumerate()
            .map(|(i, day)| PreviewRow {
                day,
                value: value[i],
                cogs: cogs[i],
                gross_profit: gross_profit[i],
                net_profit: net_profit[i],
                gross_margin: gross_margin[i],
                net_margin: net_margin[i],
            })
            .collect())
    }
}

fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Money with no decimals, "n/a" for undefined values.
pub fn format_amount(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.0}")
    } else {
        "n/a".to_string()
    }
}

/// Percentage with two decimals, "n/a" for undefined margins.
pub fn format_percent(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}%")
    } else {
        "n/a".to_string()
    }
}

/// Left side panel with dataset controls and the metrics preview.
pub struct DataPanel {
    pub data_path: PathBuf,
    pub preview_rows: usize,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub preview: Vec<PreviewRow>,
    pub status: String,
    pub is_error: bool,
}

impl DataPanel {
    pub fn new(data_path: PathBuf, preview_rows: usize) -> Self {
        Self {
            data_path,
            preview_rows,
            row_count: 0,
            column_count: 0,
            columns: Vec::new(),
            preview: Vec::new(),
            status: "Ready".to_string(),
            is_error: false,
        }
    }

    /// Update after a successful load.
    pub fn set_table(&mut self, df: &DataFrame) {
        self.row_count = df.height();
        self.columns = DataLoader::get_columns(df);
        self.column_count = self.columns.len();
        match PreviewRow::from_table(df, self.preview_rows) {
            Ok(rows) => {
                self.preview = rows;
                self.set_status(
                    &format!("Loaded {} rows, {} columns", self.row_count, self.column_count),
                    false,
                );
            }
            Err(e) => {
                self.preview.clear();
                self.set_status(&format!("Error: preview failed: {e}"), true);
            }
        }
    }

    pub fn clear(&mut self) {
        self.row_count = 0;
        self.column_count = 0;
        self.columns.clear();
        self.preview.clear();
    }

    pub fn set_status(&mut self, status: &str, is_error: bool) {
        self.status = status.to_string();
        self.is_error = is_error;
    }

    /// Draw the data panel
    pub fn show(&mut self, ui: &mut egui::Ui, is_loading: bool) -> DataPanelAction {
        let mut action = DataPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🛠 Next Action BI")
                    .size(22.0)
                    .color(Color32::from_rgb(246, 187, 77)),
            );
            ui.label(
                RichText::new("Insights & action assignments")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Sales Data").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let name = self
                    .data_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "No file selected".to_string());
                ui.label(RichText::new(name).size(12.0).color(Color32::WHITE))
                    .on_hover_text(self.data_path.display().to_string());

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!is_loading, |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = DataPanelAction::Browse;
                        }
                        if ui.button("🔄 Reload").clicked() {
                            action = DataPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(10.0);

        if is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Loading...").size(11.0));
            });
        }

        let status_color = if self.is_error {
            Color32::from_rgb(220, 53, 69)
        } else if self.row_count > 0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        if !self.columns.is_empty() {
            ui.add_space(5.0);
            egui::CollapsingHeader::new(format!("Columns ({})", self.column_count))
                .default_open(false)
                .show(ui, |ui| {
                    for name in &self.columns {
                        ui.label(RichText::new(name).size(11.0).monospace());
                    }
                });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Preview Section =====
        ui.label(RichText::new("📊 Profitability Preview").size(14.0).strong());
        ui.add_space(5.0);

        if self.preview.is_empty() {
            ui.label(RichText::new("No Data").color(Color32::GRAY));
            return action;
        }

        ScrollArea::both().max_height(420.0).show(ui, |ui| {
            egui::Grid::new("metrics_preview")
                .striped(true)
                .num_columns(7)
                .show(ui, |ui| {
                    for header in ["Day", "Value", "COGS", "Gross", "Net", "GM %", "NM %"] {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();

                    for row in &self.preview {
                        ui.label(&row.day);
                        ui.label(format_amount(row.value));
                        ui.label(format_amount(row.cogs));
                        ui.label(format_amount(row.gross_profit));
                        ui.label(format_amount(row.net_profit));
                        ui.label(format_percent(row.gross_margin));
                        ui.label(format_percent(row.net_margin));
                        ui.end_row();
                    }
                });
        });

        action
    }
}

/// Actions triggered by the data panel
#[derive(Debug, Clone, PartialEq)]
pub enum DataPanelAction {
    None,
    Browse,
    Reload,
}
