//! End-to-end checks of the dataset loader against files on disk.

use chrono::NaiveDate;
use next_action_bi::data::metrics::{
    COGS, DAY, GROSS_MARGIN, GROSS_PROFIT, NET_MARGIN, NET_PROFIT, OPERATING_COST,
};
use next_action_bi::data::{DataLoader, LoadError, LoaderError, MetricsCache, MetricsError, TableSource};
use next_action_bi::load_data;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SALES: &str = "\
docdate,brand,goldprice,stonevalue,value,discount
2024-04-13 18:42:10,TANISHQ,40000,10000,100000,5000
2024-04-13 09:05:00,MIA,1000,500,0,0
2024-04-14 11:00:00,ZOYA,250000,90000,420000,69000
";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

/// Wraps the file loader and counts how often the source is read.
#[derive(Default)]
struct CountingSource {
    reads: Arc<AtomicUsize>,
}

impl TableSource for CountingSource {
    fn read(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        DataLoader::new().read(path)
    }
}

#[test]
fn derives_all_metrics_in_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "sales.csv", SALES);

    let table = load_data(&path).unwrap();
    assert_eq!(table.height(), 3);

    let brands: Vec<&str> = table
        .column("brand")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(brands, vec!["TANISHQ", "MIA", "ZOYA"]);

    assert_eq!(floats(&table, COGS), vec![50000.0, 1500.0, 340000.0]);
    assert_eq!(floats(&table, GROSS_PROFIT), vec![50000.0, -1500.0, 80000.0]);
    assert_eq!(floats(&table, OPERATING_COST)[..2], [5000.0, 0.0]);
    assert_eq!(floats(&table, NET_PROFIT)[..2], [40000.0, -1500.0]);

    let gross = floats(&table, GROSS_MARGIN);
    let net = floats(&table, NET_MARGIN);
    assert!((gross[0] - 50.0).abs() < 1e-9);
    assert!((net[0] - 40.0).abs() < 1e-9);
    assert!(gross[1].is_nan());
    assert!(net[1].is_nan());

    let expected_net = 420000.0 - 340000.0 - 69000.0 - 0.05 * 420000.0;
    assert!((floats(&table, NET_PROFIT)[2] - expected_net).abs() < 1e-6);
    assert!((net[2] - 100.0 * expected_net / 420000.0).abs() < 1e-9);
}

#[test]
fn day_drops_time_of_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "sales.csv", SALES);

    let table = load_data(&path).unwrap();
    let days = table.column(DAY).unwrap().cast(&DataType::String).unwrap();
    let days: Vec<NaiveDate> = days
        .str()
        .unwrap()
        .into_iter()
        .map(|d| NaiveDate::parse_from_str(d.unwrap(), "%Y-%m-%d").unwrap())
        .collect();

    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2024, 4, 13).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 13).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 14).unwrap(),
        ]
    );
}

#[test]
fn repeated_loads_read_the_source_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "sales.csv", SALES);

    let source = CountingSource::default();
    let reads = Arc::clone(&source.reads);
    let cache = MetricsCache::new(source);

    let first = cache.get(&path).unwrap();
    let second = cache.get(&path).unwrap();

    assert!(first.equals_missing(&second));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.load_count(), 1);
}

#[test]
fn global_loader_returns_the_cached_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "sales.csv", SALES);

    let first = load_data(&path).unwrap();
    let second = load_data(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_data(dir.path().join("discansamp.xlsx")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn missing_stonevalue_fails_before_any_row_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "sales.csv",
        "docdate,goldprice,value,discount\n2024-01-01,40000,100000,5000\n",
    );

    let err = load_data(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Format(MetricsError::MissingColumn(ref c)) if c == "stonevalue"
    ));
}

#[test]
fn unparsable_date_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "sales.csv",
        "docdate,goldprice,stonevalue,value,discount\nsoon,1,1,10,0\n",
    );

    let err = load_data(&path).unwrap_err();
    assert!(err.is_data_format());
    assert!(matches!(err, LoadError::Format(MetricsError::InvalidDate { row: 0, .. })));
}

#[test]
fn decimal_after_ten_thousand_integer_rows_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::from("docdate,goldprice,stonevalue,value,discount\n");
    for _ in 0..10_000 {
        body.push_str("2024-01-01,40000,10000,100000,5000\n");
    }
    body.push_str("2024-01-02,40000,10000,100000.5,5000\n");
    let path = write(dir.path(), "long.csv", &body);

    let table = load_data(&path).unwrap();
    assert_eq!(table.height(), 10_001);

    let gross = floats(&table, GROSS_PROFIT);
    assert_eq!(gross[0], 50000.0);
    assert_eq!(gross[10_000], 50000.5);
    assert!((floats(&table, GROSS_MARGIN)[0] - 50.0).abs() < 1e-9);
}
