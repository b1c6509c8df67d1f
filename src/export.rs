use analytics::{percentage_returns, PerformanceReport};
use anyhow::{Context, Result};
use core_types::PriceSeries;
use csv::{Writer, WriterBuilder};
use portfolio_backtester::BacktestHistory;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Writes the run's history tables into `dir`; returns the files written.
pub fn write_history(dir: &Path, history: &BacktestHistory) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {}", dir.display()))?;

    let values_path = dir.join("values.csv");
    let mut writer = create(&values_path)?;
    let mut header = vec!["date".to_string(), "portfolio_value".to_string(), "cash".to_string()];
    header.extend(history.symbols.iter().cloned());
    writer.write_record(&header)?;
    for row in history.values.rows() {
        let mut record = vec![row.date.to_string(), row.portfolio_value.to_string(), row.cash.to_string()];
        record.extend(row.shares.iter().map(ToString::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    let positions_path = dir.join("positions.csv");
    let mut writer = create(&positions_path)?;
    let mut header = vec!["date".to_string(), "cash".to_string()];
    header.extend(history.symbols.iter().cloned());
    writer.write_record(&header)?;
    for row in history.positions.rows() {
        let mut record = vec![row.date.to_string(), row.cash.to_string()];
        record.extend(row.dollar_values.iter().map(ToString::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    let transactions_path = dir.join("transactions.csv");
    let mut writer = create_headerless(&transactions_path)?;
    writer.write_record(["date", "symbol", "amount", "price"])?;
    for row in history.transactions.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let returns_path = dir.join("returns.csv");
    let mut writer = create(&returns_path)?;
    writer.write_record(["date", "return"])?;
    for (date, change) in percentage_returns(history.values.rows()) {
        writer.write_record([date.to_string(), change.map(|r| r.to_string()).unwrap_or_default()])?;
    }
    writer.flush()?;

    Ok(vec![values_path, positions_path, transactions_path, returns_path])
}

/// Writes the performance report as `report.json` in `dir`.
pub fn write_report(dir: &Path, report: &PerformanceReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {}", dir.display()))?;
    let report_path = dir.join("report.json");
    let file = File::create(&report_path).with_context(|| format!("failed to create {}", report_path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(report_path)
}

/// Writes a price table as `date,<symbol>...`, the layout the loaders read.
pub fn write_prices(path: &Path, prices: &PriceSeries) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let mut writer = create(path)?;
    let mut header = vec!["date".to_string()];
    header.extend(prices.symbols().iter().cloned());
    writer.write_record(&header)?;
    for (date, row) in prices.iter() {
        let mut record = vec![date.to_string()];
        record.extend(row.iter().map(ToString::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<Writer<File>> {
    Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))
}

/// A writer whose `serialize` calls never emit a header row.
fn create_headerless(path: &Path) -> Result<Writer<File>> {
    WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::AnalyticsEngine;
    use chrono::NaiveDate;
    use configuration::{BacktestSettings, SimulationConfig};
    use core_types::AllocationMatrix;
    use portfolio_backtester::PortfolioSimulator;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn prices() -> PriceSeries {
        let mut prices = PriceSeries::new(vec!["A".into(), "B".into()]).unwrap();
        prices.insert_row(d(2), vec![dec!(10), dec!(20)]).unwrap();
        prices.insert_row(d(3), vec![dec!(11), dec!(19)]).unwrap();
        prices
    }

    #[test]
    fn history_files_round_trip_through_loaders() {
        let mut allocation = AllocationMatrix::new(vec!["A".into(), "B".into()]).unwrap();
        allocation.insert_weights(d(2), &[dec!(0.6), dec!(0.4)]).unwrap();
        allocation.insert_row(d(3), vec![None, None]).unwrap();
        let settings = BacktestSettings {
            start_date: Some(d(1)),
            starting_portfolio_value: dec!(1000),
            ..BacktestSettings::default()
        };
        let history = PortfolioSimulator::new(SimulationConfig::try_from(settings).unwrap(), allocation)
            .simulate(&prices())
            .unwrap();
        let report = AnalyticsEngine::new()
            .calculate(history.values.rows(), history.transactions.rows())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = write_history(dir.path(), &history).unwrap();
        assert_eq!(written.len(), 4);
        let report_path = write_report(dir.path(), &report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(json["transaction_count"], 2);

        // The position table has the same layout as a price table.
        let positions = PriceSeries::from_csv(dir.path().join("positions.csv")).unwrap();
        assert_eq!(positions.symbols(), ["cash".to_string(), "A".to_string(), "B".to_string()]);
        assert_eq!(positions.get(d(3)).unwrap(), &[dec!(0), dec!(660), dec!(380)]);

        let transactions = fs::read_to_string(dir.path().join("transactions.csv")).unwrap();
        let mut lines = transactions.lines();
        assert_eq!(lines.next(), Some("date,symbol,amount,price"));
        assert_eq!(lines.next(), Some("2024-01-02,A,60,10"));
        assert_eq!(lines.count(), 1);

        let returns = fs::read_to_string(dir.path().join("returns.csv")).unwrap();
        assert_eq!(returns.lines().nth(1), Some("2024-01-02,"));
        assert_eq!(returns.lines().nth(2), Some("2024-01-03,0.04"));
    }

    #[test]
    fn hold_only_run_still_writes_transaction_header() {
        let mut allocation = AllocationMatrix::new(vec!["A".into(), "B".into()]).unwrap();
        allocation.insert_row(d(2), vec![None, None]).unwrap();
        allocation.insert_row(d(3), vec![None, None]).unwrap();
        let settings = BacktestSettings { start_date: Some(d(1)), ..BacktestSettings::default() };
        let history = PortfolioSimulator::new(SimulationConfig::try_from(settings).unwrap(), allocation)
            .simulate(&prices())
            .unwrap();
        assert!(history.transactions.is_empty());

        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), &history).unwrap();
        let transactions = fs::read_to_string(dir.path().join("transactions.csv")).unwrap();
        assert_eq!(transactions, "date,symbol,amount,price\n");
    }

    #[test]
    fn price_file_reloads_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prices.csv");
        write_prices(&path, &prices()).unwrap();
        assert_eq!(PriceSeries::from_csv(&path).unwrap(), prices());
    }
}
