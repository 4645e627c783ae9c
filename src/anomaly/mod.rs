//! Outlier detection over numeric columns
//!
//! Each numeric column is scanned independently under the selected method;
//! per-column flag vectors are OR-reduced into a single set of outlier rows.

mod isolation_forest;

pub use isolation_forest::IsolationForest;

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Default RNG seed for the isolation-forest method
pub const DEFAULT_FOREST_SEED: u64 = 42;

/// Method for flagging anomalous values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// Interquartile range fences
    Iqr { factor: f64 },
    /// Standard score against population mean and deviation
    ZScore { threshold: f64 },
    /// Per-column isolation forest with auto-estimated contamination
    IsolationForest { seed: u64 },
}

impl Default for OutlierMethod {
    fn default() -> Self {
        OutlierMethod::Iqr { factor: 1.5 }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr { .. } => write!(f, "iqr"),
            OutlierMethod::ZScore { .. } => write!(f, "z-score"),
            OutlierMethod::IsolationForest { .. } => write!(f, "isolation-forest"),
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = crate::error::PurifaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "iqr" => Ok(OutlierMethod::Iqr { factor: 1.5 }),
            "z-score" => Ok(OutlierMethod::ZScore { threshold: 3.0 }),
            "isolation-forest" => Ok(OutlierMethod::IsolationForest {
                seed: DEFAULT_FOREST_SEED,
            }),
            other => Err(crate::error::PurifaiError::UnsupportedStrategy(
                other.to_string(),
            )),
        }
    }
}

/// Result of an outlier scan
#[derive(Debug, Clone)]
pub struct OutlierScan {
    /// Sorted, deduplicated indices of rows flagged in at least one column
    pub rows: Vec<usize>,
    /// Sub-table restricted to the flagged rows, for inspection
    pub outliers: DataFrame,
}

impl OutlierScan {
    /// Number of flagged rows
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// Outlier detector over a table's numeric columns
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    method: OutlierMethod,
}

impl OutlierDetector {
    /// Create a detector for the given method
    pub fn new(method: OutlierMethod) -> Self {
        Self { method }
    }

    /// Scan the table and return the flagged row set plus the flagged-row view.
    ///
    /// The input is never mutated. Columns with too little data for the
    /// method (fewer than 2 non-missing values for IQR, zero variance for
    /// z-score, zero contamination estimate for the forest) contribute no
    /// flags.
    pub fn detect(&self, df: &DataFrame) -> Result<OutlierScan> {
        let height = df.height();
        let mut row_flags = vec![false; height];

        for col in df.get_columns() {
            if !col.dtype().is_primitive_numeric() {
                continue;
            }
            let series = col.cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let flags = match self.method {
                OutlierMethod::Iqr { factor } => flag_by_iqr(ca, factor),
                OutlierMethod::ZScore { threshold } => flag_by_zscore(ca, threshold),
                OutlierMethod::IsolationForest { seed } => flag_by_forest(ca, seed),
            };

            if let Some(flags) = flags {
                let flagged = flags.iter().filter(|&&f| f).count();
                if flagged > 0 {
                    debug!(column = %col.name(), flagged, "column flagged outliers");
                }
                for (row_flag, flag) in row_flags.iter_mut().zip(flags) {
                    *row_flag |= flag;
                }
            }
        }

        let rows: Vec<usize> = row_flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect();

        let idx = IdxCa::from_vec(
            "rows".into(),
            rows.iter().map(|&i| i as IdxSize).collect(),
        );
        let outliers = df.take(&idx)?;

        Ok(OutlierScan { rows, outliers })
    }
}

/// IQR fences of the column's non-missing values, if it has at least two
fn iqr_bounds(ca: &Float64Chunked, factor: f64) -> Option<(f64, f64)> {
    if ca.len() - ca.null_count() < 2 {
        return None;
    }
    let q1 = ca.quantile(0.25, QuantileMethod::Linear).ok()??;
    let q3 = ca.quantile(0.75, QuantileMethod::Linear).ok()??;
    let iqr = q3 - q1;
    Some((q1 - factor * iqr, q3 + factor * iqr))
}

fn flag_by_iqr(ca: &Float64Chunked, factor: f64) -> Option<Vec<bool>> {
    let (lower, upper) = iqr_bounds(ca, factor)?;
    Some(
        ca.into_iter()
            .map(|v| v.map(|v| v < lower || v > upper).unwrap_or(false))
            .collect(),
    )
}

fn flag_by_zscore(ca: &Float64Chunked, threshold: f64) -> Option<Vec<bool>> {
    let mean = ca.mean()?;
    // Population deviation; a constant column is skipped rather than divided by
    let std = ca.std(0)?;
    if std == 0.0 {
        return None;
    }
    Some(
        ca.into_iter()
            .map(|v| {
                v.map(|v| ((v - mean) / std).abs() > threshold)
                    .unwrap_or(false)
            })
            .collect(),
    )
}

fn flag_by_forest(ca: &Float64Chunked, seed: u64) -> Option<Vec<bool>> {
    let (lower, upper) = iqr_bounds(ca, 1.5)?;

    // Non-missing values with their row positions
    let mut positions = Vec::new();
    let mut values = Vec::new();
    for (i, v) in ca.into_iter().enumerate() {
        if let Some(v) = v {
            positions.push(i);
            values.push(v);
        }
    }

    let fence_outliers = values.iter().filter(|&&v| v < lower || v > upper).count();
    if fence_outliers == 0 {
        return None;
    }
    let contamination = fence_outliers as f64 / values.len() as f64;

    let forest = IsolationForest::new(contamination).with_seed(seed);
    let value_flags = forest.flag(&values);

    let mut flags = vec![false; ca.len()];
    for (pos, flagged) in positions.into_iter().zip(value_flags) {
        flags[pos] = flagged;
    }
    Some(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_outlier() -> DataFrame {
        df!(
            "value" => &[1.0, 2.0, 3.0, 4.0, 100.0],
            "label" => &["a", "b", "c", "d", "e"],
        )
        .unwrap()
    }

    #[test]
    fn test_iqr_boundary_values() {
        // Q1=2, Q3=4, IQR=2 => fences [-1, 7]; only 100 falls outside
        let df = frame_with_outlier();
        let scan = OutlierDetector::new(OutlierMethod::Iqr { factor: 1.5 })
            .detect(&df)
            .unwrap();
        assert_eq!(scan.rows, vec![4]);
        assert_eq!(scan.outliers.height(), 1);
    }

    #[test]
    fn test_zscore_zero_variance_column() {
        let df = df!("constant" => &[5.0, 5.0, 5.0, 5.0]).unwrap();
        let scan = OutlierDetector::new(OutlierMethod::ZScore { threshold: 3.0 })
            .detect(&df)
            .unwrap();
        assert!(scan.rows.is_empty());
    }

    #[test]
    fn test_zscore_flags_extreme_value() {
        let mut values: Vec<f64> = (0..30).map(|i| (i % 10) as f64).collect();
        values.push(500.0);
        let df = df!("value" => &values).unwrap();
        let scan = OutlierDetector::new(OutlierMethod::ZScore { threshold: 3.0 })
            .detect(&df)
            .unwrap();
        assert_eq!(scan.rows, vec![30]);
    }

    #[test]
    fn test_forest_flags_extreme_value() {
        let mut values: Vec<f64> = (0..20).map(|i| (i % 10) as f64).collect();
        values.push(1000.0);
        let df = df!("value" => &values).unwrap();
        let scan = OutlierDetector::new(OutlierMethod::IsolationForest {
            seed: DEFAULT_FOREST_SEED,
        })
        .detect(&df)
        .unwrap();
        assert_eq!(scan.rows, vec![20]);
    }

    #[test]
    fn test_row_union_across_columns() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0, 100.0],
            "b" => &[-100.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let scan = OutlierDetector::new(OutlierMethod::default())
            .detect(&df)
            .unwrap();
        assert_eq!(scan.rows, vec![0, 4]);
    }

    #[test]
    fn test_missing_cells_never_flagged() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(3.0), Some(4.0), Some(2.0), Some(100.0)],
        )
        .unwrap();
        let scan = OutlierDetector::new(OutlierMethod::default())
            .detect(&df)
            .unwrap();
        assert_eq!(scan.rows, vec![5]);
    }

    #[test]
    fn test_no_numeric_columns() {
        let df = df!("name" => &["x", "y", "z"]).unwrap();
        let scan = OutlierDetector::new(OutlierMethod::default())
            .detect(&df)
            .unwrap();
        assert!(scan.rows.is_empty());
        assert_eq!(scan.outliers.height(), 0);
    }

    #[test]
    fn test_tiny_column_skipped() {
        let df = df!("single" => &[Some(7.0), None, None]).unwrap();
        let scan = OutlierDetector::new(OutlierMethod::default())
            .detect(&df)
            .unwrap();
        assert!(scan.rows.is_empty());
    }

    #[test]
    fn test_method_parsing() {
        assert!(matches!(
            "iqr".parse::<OutlierMethod>().unwrap(),
            OutlierMethod::Iqr { .. }
        ));
        assert!(matches!(
            "z-score".parse::<OutlierMethod>().unwrap(),
            OutlierMethod::ZScore { .. }
        ));
        assert!(matches!(
            "isolation-forest".parse::<OutlierMethod>().unwrap(),
            OutlierMethod::IsolationForest { .. }
        ));
        assert!("lof".parse::<OutlierMethod>().is_err());
    }

    #[test]
    fn test_method_display_round_trip() {
        for name in ["iqr", "z-score", "isolation-forest"] {
            let method: OutlierMethod = name.parse().unwrap();
            assert_eq!(method.to_string(), name);
        }
    }
}
