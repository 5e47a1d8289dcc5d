//! Per-column min/max feature scaling to [0, 1], with an exact inverse.
//!
//! Fit once over the rows available at prediction time, transform the
//! lookback window, and invert the oracle's scaled output back to a price.
//! A constant column (min == max) gets a zero-variance identity transform:
//! it scales to 0.0 and inverts to its min. [`MinMaxScaler::fit_strict`]
//! surfaces that case as an error instead for callers that care.

use crate::domain::enrich::FEATURE_COUNT;
use crate::domain::error::SibylError;

#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    mins: [f64; FEATURE_COUNT],
    ranges: [f64; FEATURE_COUNT],
}

impl MinMaxScaler {
    /// Fit column minima and ranges. Degenerate columns are substituted with
    /// the identity transform.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut mins = [f64::INFINITY; FEATURE_COUNT];
        let mut maxs = [f64::NEG_INFINITY; FEATURE_COUNT];

        for row in rows {
            for (col, &v) in row.iter().enumerate() {
                mins[col] = mins[col].min(v);
                maxs[col] = maxs[col].max(v);
            }
        }

        let mut ranges = [0.0; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            let range = maxs[col] - mins[col];
            ranges[col] = if range > 0.0 { range } else { 0.0 };
            if rows.is_empty() {
                mins[col] = 0.0;
            }
        }

        MinMaxScaler { mins, ranges }
    }

    /// Like [`fit`](Self::fit) but fails on the first constant column.
    pub fn fit_strict(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self, SibylError> {
        let scaler = Self::fit(rows);
        match scaler.ranges.iter().position(|&r| r == 0.0) {
            Some(column) => Err(SibylError::DegenerateScale { column }),
            None => Ok(scaler),
        }
    }

    pub fn transform_row(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            out[col] = if self.ranges[col] == 0.0 {
                0.0
            } else {
                (row[col] - self.mins[col]) / self.ranges[col]
            };
        }
        out
    }

    pub fn transform(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Invert one column's scaled value back to its original range. For a
    /// degenerate column this returns the column min.
    pub fn inverse_column(&self, scaled: f64, column: usize) -> f64 {
        self.mins[column] + scaled * self.ranges[column]
    }
}
