//! CSV file history adapter.
//!
//! Serves daily bars from a directory of `<SYMBOL>.csv` files with the
//! header `date,open,high,low,close,volume`. Dates are ISO `YYYY-MM-DD`.

use crate::domain::error::SibylError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::HistoryPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvHistoryAdapter {
    base_path: PathBuf,
}

impl CsvHistoryAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn parse_row(symbol: &str, record: &csv::StringRecord) -> Result<PriceBar, SibylError> {
        let date_str = field(record, 0, "date")?;
        let date =
            NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| SibylError::Data {
                reason: format!("invalid date {:?}: {}", date_str, e),
            })?;

        Ok(PriceBar {
            symbol: symbol.to_string(),
            date,
            open: parse_field(record, 1, "open")?,
            high: parse_field(record, 2, "high")?,
            low: parse_field(record, 3, "low")?,
            close: parse_field(record, 4, "close")?,
            volume: parse_field(record, 5, "volume")?,
        })
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'a str, SibylError> {
    record.get(index).ok_or_else(|| SibylError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, SibylError>
where
    T::Err: std::fmt::Display,
{
    field(record, index, name)?
        .parse()
        .map_err(|e| SibylError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl HistoryPort for CsvHistoryAdapter {
    fn get_history(&self, symbol: &str) -> Result<Vec<PriceBar>, SibylError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(SibylError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SibylError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SibylError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            bars.push(Self::parse_row(symbol, &record)?);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SibylError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
