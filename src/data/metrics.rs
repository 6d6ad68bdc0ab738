//! Profitability Metrics Module
//! Derives cost, profit and margin columns from raw sales transactions.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;

/// Share of the sale value booked as operating overhead.
pub const OPERATING_COST_RATE: f64 = 0.05;

/// Source column names. Exact and case-sensitive.
pub const DOCDATE: &str = "docdate";
pub const GOLD_PRICE: &str = "goldprice";
pub const STONE_VALUE: &str = "stonevalue";
pub const SALE_VALUE: &str = "value";
pub const DISCOUNT: &str = "discount";

pub const REQUIRED_COLUMNS: [&str; 5] = [DOCDATE, GOLD_PRICE, STONE_VALUE, SALE_VALUE, DISCOUNT];

/// Derived column names, in the order they are appended.
pub const DAY: &str = "day";
pub const COGS: &str = "cogs";
pub const GROSS_PROFIT: &str = "gross_profit";
pub const OPERATING_COST: &str = "operating_cost";
pub const NET_PROFIT: &str = "net_profit";
pub const GROSS_MARGIN: &str = "gross_margin";
pub const NET_MARGIN: &str = "net_margin";

pub const DERIVED_COLUMNS: [&str; 7] = [
    DAY,
    COGS,
    GROSS_PROFIT,
    OPERATING_COST,
    NET_PROFIT,
    GROSS_MARGIN,
    NET_MARGIN,
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Unparsable date in 'docdate' at row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },
    #[error("Column '{column}' contains non-numeric values")]
    NonNumeric { column: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One sales transaction as read from the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transaction {
    pub document_date: NaiveDateTime,
    pub gold_price: f64,
    pub stone_value: f64,
    pub sale_value: f64,
    pub discount: f64,
}

/// Fields computed from a single [`Transaction`].
///
/// Margins are NaN when the sale value is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub day: NaiveDate,
    pub cogs: f64,
    pub gross_profit: f64,
    pub operating_cost: f64,
    pub net_profit: f64,
    pub gross_margin: f64,
    pub net_margin: f64,
}

impl Transaction {
    /// Compute every derived field in dependency order.
    pub fn derive(&self) -> DerivedMetrics {
        let cogs = self.gold_price + self.stone_value;
        let gross_profit = self.sale_value - cogs;
        let operating_cost = OPERATING_COST_RATE * self.sale_value;
        let net_profit = gross_profit - self.discount - operating_cost;

        DerivedMetrics {
            day: self.document_date.date(),
            cogs,
            gross_profit,
            operating_cost,
            net_profit,
            gross_margin: margin(gross_profit, self.sale_value),
            net_margin: margin(net_profit, self.sale_value),
        }
    }
}

/// Profit as a percentage of the sale value. Zero sale value yields NaN.
pub fn margin(profit: f64, sale_value: f64) -> f64 {
    if sale_value == 0.0 {
        f64::NAN
    } else {
        (profit / sale_value) * 100.0
    }
}

/// Parse a document date in any of the layouts seen in exported sales sheets.
pub fn parse_document_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|d| d.naive_local())
        })
}

/// Turns a raw sales table into the augmented metrics table.
pub struct MetricsDeriver;

impl MetricsDeriver {
    /// Fail fast if any required column is absent.
    pub fn check_columns(df: &DataFrame) -> Result<(), MetricsError> {
        for name in REQUIRED_COLUMNS {
            df.column(name)
                .map_err(|_| MetricsError::MissingColumn(name.to_string()))?;
        }
        Ok(())
    }

    /// Read every row as a typed [`Transaction`], preserving source order.
    pub fn transactions(df: &DataFrame) -> Result<Vec<Transaction>, MetricsError> {
        Self::check_columns(df)?;

        let dates = Self::parse_dates(df.column(DOCDATE)?)?;
        let gold = Self::numeric_values(df, GOLD_PRICE)?;
        let stone = Self::numeric_values(df, STONE_VALUE)?;
        let sale = Self::numeric_values(df, SALE_VALUE)?;
        let discount = Self::numeric_values(df, DISCOUNT)?;

        let rows = (0..df.height())
            .map(|i| Transaction {
                document_date: dates[i],
                gold_price: gold[i],
                stone_value: stone[i],
                sale_value: sale[i],
                discount: discount[i],
            })
            .collect();

        Ok(rows)
    }

    /// Return all source columns plus the seven derived columns.
    ///
    /// `docdate` is replaced by its parsed datetime form.
    pub fn derive(df: &DataFrame) -> Result<DataFrame, MetricsError> {
        let rows = Self::transactions(df)?;
        let derived: Vec<DerivedMetrics> = rows.iter().map(Transaction::derive).collect();

        let dates: Vec<NaiveDateTime> = rows.iter().map(|r| r.document_date).collect();
        let days: Vec<NaiveDate> = derived.iter().map(|m| m.day).collect();
        let field = |f: fn(&DerivedMetrics) -> f64| derived.iter().map(f).collect::<Vec<f64>>();

        let mut out = df.clone();
        out.with_column(Column::new(DOCDATE.into(), dates))?;
        out.with_column(Column::new(DAY.into(), days))?;
        out.with_column(Column::new(COGS.into(), field(|m| m.cogs)))?;
        out.with_column(Column::new(GROSS_PROFIT.into(), field(|m| m.gross_profit)))?;
        out.with_column(Column::new(OPERATING_COST.into(), field(|m| m.operating_cost)))?;
        out.with_column(Column::new(NET_PROFIT.into(), field(|m| m.net_profit)))?;
        out.with_column(Column::new(GROSS_MARGIN.into(), field(|m| m.gross_margin)))?;
        out.with_column(Column::new(NET_MARGIN.into(), field(|m| m.net_margin)))?;

        let undefined = derived.iter().filter(|m| m.gross_margin.is_nan()).count();
        if undefined > 0 {
            tracing::warn!(rows = undefined, "margins undefined for zero or empty sale values");
        }

        Ok(out)
    }

    fn parse_dates(column: &Column) -> Result<Vec<NaiveDateTime>, MetricsError> {
        let text = column.cast(&DataType::String)?;
        let values = text.str()?;

        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let raw = value.unwrap_or_default();
                parse_document_date(raw).ok_or_else(|| MetricsError::InvalidDate {
                    row,
                    value: raw.to_string(),
                })
            })
            .collect()
    }

    /// Cast a column to f64. Empty cells become NaN; text that does not
    /// parse as a number is rejected.
    fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, MetricsError> {
        let column = df.column(name)?;
        let cast = column.cast(&DataType::Float64)?;

        if cast.null_count() > column.null_count() {
            return Err(MetricsError::NonNumeric {
                column: name.to_string(),
            });
        }

        Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}
