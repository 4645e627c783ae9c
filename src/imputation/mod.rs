//! Missing-value imputation
//!
//! Fills the numeric cells left missing by ingestion or nullification. The
//! neighbor count for the knn strategy is not fixed: it is derived from the
//! numeric sub-table's completeness once per run.

mod knn;

pub use knn::KnnImputer;

use crate::error::{PurifaiError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Check if an in-matrix value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// Strategy for filling missing numeric cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeMethod {
    /// Nearest-neighbor average with adaptive k
    Knn,
    /// Column mean
    Mean,
    /// Column median
    Median,
}

impl Default for ImputeMethod {
    fn default() -> Self {
        ImputeMethod::Knn
    }
}

impl fmt::Display for ImputeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeMethod::Knn => write!(f, "knn"),
            ImputeMethod::Mean => write!(f, "mean"),
            ImputeMethod::Median => write!(f, "median"),
        }
    }
}

impl FromStr for ImputeMethod {
    type Err = PurifaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "knn" => Ok(ImputeMethod::Knn),
            "mean" => Ok(ImputeMethod::Mean),
            "median" => Ok(ImputeMethod::Median),
            other => Err(PurifaiError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// Neighbor count for knn imputation, derived from the number of complete
/// rows in the numeric sub-table: `clamp(n_complete - 1, 2, 5)`.
///
/// Fewer than 2 complete rows leaves no usable neighbor pool; `None` tells
/// the caller to skip the imputation pass entirely.
pub fn adaptive_neighbor_count(n_complete: usize) -> Option<usize> {
    if n_complete < 2 {
        return None;
    }
    Some((n_complete - 1).clamp(2, 5))
}

/// Imputer that fills missing numeric cells under a caller-selected strategy
#[derive(Debug, Clone)]
pub struct AdaptiveImputer {
    method: ImputeMethod,
}

impl AdaptiveImputer {
    /// Create an imputer for the given method
    pub fn new(method: ImputeMethod) -> Self {
        Self { method }
    }

    /// Fill missing numeric cells, returning a new table.
    ///
    /// A table with no missing numeric cell is returned unchanged. The knn
    /// strategy silently skips the pass when fewer than 2 complete rows
    /// exist; mean/median fail with `InsufficientData` on a column with no
    /// observed value at all.
    pub fn impute(&self, df: &DataFrame) -> Result<DataFrame> {
        let numeric: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype().is_primitive_numeric())
            .map(|c| c.name().to_string())
            .collect();

        let total_missing: usize = numeric
            .iter()
            .map(|name| df.column(name).map(|c| c.null_count()).unwrap_or(0))
            .sum();
        if total_missing == 0 {
            return Ok(df.clone());
        }

        match self.method {
            ImputeMethod::Mean | ImputeMethod::Median => self.fill_per_column(df, &numeric),
            ImputeMethod::Knn => self.fill_by_neighbors(df, &numeric),
        }
    }

    fn fill_per_column(&self, df: &DataFrame, numeric: &[String]) -> Result<DataFrame> {
        let mut result = df.clone();

        for name in numeric {
            let col = df.column(name.as_str())?;
            if col.null_count() == 0 {
                continue;
            }

            let series = col.cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let fill = match self.method {
                ImputeMethod::Mean => ca.mean(),
                ImputeMethod::Median => ca.median(),
                ImputeMethod::Knn => unreachable!("knn is handled by fill_by_neighbors"),
            };
            let fill = fill.ok_or_else(|| {
                PurifaiError::InsufficientData(format!(
                    "column '{name}' has no observed values to impute from"
                ))
            })?;

            let filled: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(fill)).collect();
            result.with_column(Series::new(name.as_str().into(), filled))?;
        }

        Ok(result)
    }

    fn fill_by_neighbors(&self, df: &DataFrame, numeric: &[String]) -> Result<DataFrame> {
        let n_rows = df.height();
        let n_cols = numeric.len();

        // Numeric sub-table with NaN as the in-matrix missing marker
        let mut matrix = Array2::from_elem((n_rows, n_cols), f64::NAN);
        for (j, name) in numeric.iter().enumerate() {
            let series = df.column(name.as_str())?.cast(&DataType::Float64)?;
            let ca = series.f64()?;
            for (i, v) in ca.into_iter().enumerate() {
                matrix[[i, j]] = v.unwrap_or(f64::NAN);
            }
        }

        let n_complete = matrix
            .rows()
            .into_iter()
            .filter(|row| !row.iter().any(|&v| is_missing(v)))
            .count();

        let Some(k) = adaptive_neighbor_count(n_complete) else {
            debug!(
                n_complete,
                "fewer than 2 complete rows, skipping knn imputation"
            );
            return Ok(df.clone());
        };
        debug!(n_complete, k, "knn imputation with adaptive neighbor count");

        let imputer = KnnImputer::fit(&matrix, k).ok_or_else(|| {
            PurifaiError::InsufficientData("no complete rows for knn imputation".to_string())
        })?;
        let filled = imputer.transform(&matrix);

        let mut result = df.clone();
        for (j, name) in numeric.iter().enumerate() {
            let values: Vec<f64> = (0..n_rows).map(|i| filled[[i, j]]).collect();
            result.with_column(Series::new(name.as_str().into(), values))?;
        }

        Ok(result)
    }
}
