//! Cleaning pipeline coordinator
//!
//! Sequences coercion, outlier detection, nullification, and imputation over
//! a single table, and assembles the before/after QC summary. Every stage
//! works on its own copy; the caller's frame is never mutated and the input
//! row count is never reduced.

use crate::anomaly::{OutlierDetector, OutlierMethod};
use crate::error::{PurifaiError, Result};
use crate::imputation::{AdaptiveImputer, ImputeMethod};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Per-column missing-cell counts before and after cleaning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCheck {
    pub column: String,
    pub missing_before: usize,
    pub missing_after: usize,
}

/// Quality-control record computed once per pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcSummary {
    pub initial_rows: usize,
    pub final_rows: usize,
    pub missing_before: usize,
    pub missing_after: usize,
    pub outliers_detected: usize,
    pub outlier_method: String,
    pub imputation_method: String,
    pub column_checks: Vec<ColumnCheck>,
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// Snapshot taken after type coercion, before any cell was changed
    pub original: DataFrame,
    /// Fully cleaned table
    pub cleaned: DataFrame,
    pub summary: QcSummary,
}

/// End-to-end cleaning pipeline
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    outlier_method: OutlierMethod,
    impute_method: ImputeMethod,
}

impl CleaningPipeline {
    /// Create a pipeline with the given strategies
    pub fn new(outlier_method: OutlierMethod, impute_method: ImputeMethod) -> Self {
        Self {
            outlier_method,
            impute_method,
        }
    }

    /// Run the full pipeline: coerce, detect, nullify, impute, summarize.
    pub fn run(&self, df: &DataFrame) -> Result<CleaningOutcome> {
        if df.height() == 0 || df.width() == 0 {
            return Err(PurifaiError::InvalidInput("empty table".to_string()));
        }

        let original = coerce_numeric(df)?;
        let initial_rows = original.height();
        let missing_before = count_missing(&original);

        let scan = OutlierDetector::new(self.outlier_method).detect(&original)?;
        debug!(outliers = scan.count(), "outlier scan complete");

        let nullified = nullify_rows(&original, &scan.rows)?;
        let cleaned = AdaptiveImputer::new(self.impute_method).impute(&nullified)?;

        let missing_after = count_missing(&cleaned);
        let column_checks = column_checks(&original, &cleaned)?;

        let summary = QcSummary {
            initial_rows,
            final_rows: cleaned.height(),
            missing_before,
            missing_after,
            outliers_detected: scan.count(),
            outlier_method: self.outlier_method.to_string(),
            imputation_method: self.impute_method.to_string(),
            column_checks,
        };
        info!(
            rows = summary.initial_rows,
            outliers = summary.outliers_detected,
            missing_before = summary.missing_before,
            missing_after = summary.missing_after,
            "cleaning pipeline finished"
        );

        Ok(CleaningOutcome {
            original,
            cleaned,
            summary,
        })
    }
}

/// Best-effort numeric coercion.
///
/// Numeric columns widen to Float64 with NaN normalized to null. String
/// columns convert only when every non-null value parses as a number; a
/// failed conversion keeps the column as-is and is not an error. Other
/// dtypes pass through.
pub fn coerce_numeric(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    for col in df.get_columns() {
        let name = col.name().clone();
        match col.dtype() {
            dtype if dtype.is_primitive_numeric() => {
                let casted = col.cast(&DataType::Float64)?;
                result.with_column(nan_to_null(&casted)?)?;
            }
            DataType::String => {
                let casted = match col.cast(&DataType::Float64) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                // Lossless only: new nulls mean some value failed to parse
                if casted.null_count() == col.null_count() {
                    debug!(column = %name, "coerced text column to numeric");
                    result.with_column(nan_to_null(&casted)?)?;
                }
            }
            _ => {}
        }
    }

    Ok(result)
}

/// Replace NaN with null so missing has a single representation
fn nan_to_null(col: &Column) -> Result<Series> {
    let ca = col.f64()?;
    let values: Vec<Option<f64>> = ca
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(Series::new(col.name().clone(), values))
}

/// Null out every numeric cell of the given rows, returning a new table.
///
/// The policy is column-wide: one anomalous column invalidates the whole
/// row's numeric data, so every numeric column is nulled at that row.
pub fn nullify_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    if rows.is_empty() {
        return Ok(df.clone());
    }
    let flagged: HashSet<usize> = rows.iter().copied().collect();
    let mut result = df.clone();

    for col in df.get_columns() {
        if !col.dtype().is_primitive_numeric() {
            continue;
        }
        let series = col.cast(&DataType::Float64)?;
        let ca = series.f64()?;
        let values: Vec<Option<f64>> = ca
            .into_iter()
            .enumerate()
            .map(|(i, v)| if flagged.contains(&i) { None } else { v })
            .collect();
        result.with_column(Series::new(col.name().clone(), values))?;
    }

    Ok(result)
}

/// Total missing-cell count across all columns
pub fn count_missing(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

fn column_checks(original: &DataFrame, cleaned: &DataFrame) -> Result<Vec<ColumnCheck>> {
    original
        .get_columns()
        .iter()
        .map(|col| {
            let after = cleaned.column(col.name().as_str())?.null_count();
            Ok(ColumnCheck {
                column: col.name().to_string(),
                missing_before: col.null_count(),
                missing_after: after,
            })
        })
        .collect()
}
