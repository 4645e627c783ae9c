//! purifai - Tabular data cleaning engine
//!
//! Detects anomalous numeric values, removes them, and reconstructs the
//! missing cells through adaptively parameterized imputation, producing a
//! cleaned table plus a quality-control summary of what changed.
//!
//! # Modules
//!
//! - [`anomaly`] - Outlier detection (IQR, z-score, isolation forest)
//! - [`imputation`] - Missing value imputation (knn with adaptive k, mean, median)
//! - [`pipeline`] - Pipeline coordinator, nullification, QC summary
//! - [`utils`] - CSV boundary and result serialization
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Cleaning stages
pub mod anomaly;
pub mod imputation;
pub mod pipeline;

// Boundary
pub mod utils;

// Services
pub mod cli;

pub use error::{PurifaiError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PurifaiError, Result};

    // Outlier detection
    pub use crate::anomaly::{IsolationForest, OutlierDetector, OutlierMethod, OutlierScan};

    // Imputation
    pub use crate::imputation::{
        adaptive_neighbor_count, AdaptiveImputer, ImputeMethod, KnnImputer,
    };

    // Pipeline
    pub use crate::pipeline::{
        coerce_numeric, count_missing, nullify_rows, CleaningOutcome, CleaningPipeline,
        ColumnCheck, QcSummary,
    };

    // CSV boundary
    pub use crate::utils::{read_csv_bytes, DataLoader, DataSaver};
}
