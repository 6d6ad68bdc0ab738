//! Dataset Loader Module
//! Reads CSV and spreadsheet files into Polars DataFrames.

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read table: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to load spreadsheet: {0}")]
    SpreadsheetError(String),
    #[error("Spreadsheet has no header row: {}", .0.display())]
    EmptySheet(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk layout of a dataset, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceFormat::Spreadsheet,
            _ => SourceFormat::Csv,
        }
    }
}

/// Anything that can turn a path into a raw table.
///
/// The metrics cache is generic over this so tests can count reads.
pub trait TableSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<DataFrame, LoaderError>;
}

/// Reads datasets from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        // Infer over every row: a decimal far down an integer-looking
        // column must widen it to Float64 instead of failing the parse.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()?
            .collect()?;

        Ok(df)
    }

    /// Load the first worksheet of a workbook. The first row holds column names.
    pub fn load_spreadsheet(path: &Path) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| LoaderError::SpreadsheetError(e.to_string()))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoaderError::EmptySheet(path.to_path_buf()))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| LoaderError::SpreadsheetError(format!("{sheet}: {e}")))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Err(LoaderError::EmptySheet(path.to_path_buf()));
        };

        let names = header_names(header);
        let body: Vec<&[Data]> = rows.collect();

        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| sheet_column(name, idx, &body))
            .collect();

        tracing::debug!(sheet = %sheet, rows = body.len(), "read worksheet");
        Ok(DataFrame::new(columns)?)
    }

    /// Get list of column names from a DataFrame.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl TableSource for DataLoader {
    fn read(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let format = SourceFormat::from_path(path);
        tracing::info!(path = %path.display(), ?format, "reading dataset");

        match format {
            SourceFormat::Csv => Self::load_csv(path),
            SourceFormat::Spreadsheet => Self::load_spreadsheet(path),
        }
    }
}

/// Build one column from a worksheet. All-numeric columns become Float64,
/// anything else is kept as text so the metrics step can parse it.
fn sheet_column(name: &str, idx: usize, rows: &[&[Data]]) -> Column {
    let cells: Vec<Option<&Data>> = rows.iter().map(|row| row.get(idx)).collect();

    let numeric = cells.iter().all(|cell| {
        matches!(
            cell,
            None | Some(Data::Empty) | Some(Data::Int(_)) | Some(Data::Float(_))
        )
    });

    if numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Some(Data::Int(i)) => Some(*i as f64),
                Some(Data::Float(f)) => Some(*f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| cell.and_then(cell_text))
            .collect();
        Column::new(name.into(), values)
    }
}

/// Column names from the header row. Blank cells become `Unnamed: <idx>`
/// and repeated names get a `.<n>` suffix, so every name is unique.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = cell_text(cell)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {idx}"));

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(format!("#ERR({:?})", e)),
    }
}
