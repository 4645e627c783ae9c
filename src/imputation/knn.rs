//! Nearest-neighbor imputation over the numeric sub-table

use crate::imputation::is_missing;
use ndarray::{Array1, Array2, Axis};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered distance for the neighbor heap
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap by distance, so the worst neighbor is popped first
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// K-nearest-neighbor imputer.
///
/// Missing cells are NaN. Neighbors are drawn from the complete rows only;
/// each missing cell becomes the uniform average of its k nearest complete
/// rows, with distances computed over the dimensions both rows share.
#[derive(Debug, Clone)]
pub struct KnnImputer {
    n_neighbors: usize,
    complete_rows: Array2<f64>,
    column_means: Array1<f64>,
}

impl KnnImputer {
    /// Build the imputer from the complete rows of `x`.
    ///
    /// Returns `None` when no complete row exists; the caller decides whether
    /// that is a skip or an error.
    pub fn fit(x: &Array2<f64>, n_neighbors: usize) -> Option<Self> {
        let complete: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        if complete.is_empty() {
            return None;
        }

        let n_features = x.ncols();
        let mut complete_rows = Array2::zeros((complete.len(), n_features));
        for (i, &row_idx) in complete.iter().enumerate() {
            for j in 0..n_features {
                complete_rows[[i, j]] = x[[row_idx, j]];
            }
        }

        let column_means = complete_rows.mean_axis(Axis(0))?;

        Some(Self {
            n_neighbors: n_neighbors.max(1),
            complete_rows,
            column_means,
        })
    }

    /// Euclidean distance over the dimensions where neither value is missing,
    /// scaled by the shared-dimension count.
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;

        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            count += 1;
            let d = ai - bi;
            accum += d * d;
        }

        if count == 0 {
            return f64::INFINITY;
        }
        (accum / count as f64).sqrt()
    }

    fn find_neighbors(&self, sample: &[f64]) -> Vec<usize> {
        let k = self.n_neighbors;
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, row) in self.complete_rows.rows().into_iter().enumerate() {
            let row_vec: Vec<f64>;
            let row_slice = match row.as_slice() {
                Some(s) => s,
                None => {
                    row_vec = row.iter().copied().collect();
                    &row_vec
                }
            };
            let dist = Self::distance(sample, row_slice);
            if !dist.is_finite() {
                continue;
            }

            if heap.len() < k {
                heap.push(DistanceIdx(dist, i));
            } else if let Some(&DistanceIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistanceIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistanceIdx(_, i)| i).collect()
    }

    fn impute_value(&self, neighbors: &[usize], feature_idx: usize) -> f64 {
        if neighbors.is_empty() {
            // No row shares a non-missing dimension with the sample
            return self.column_means[feature_idx];
        }
        let sum: f64 = neighbors
            .iter()
            .map(|&i| self.complete_rows[[i, feature_idx]])
            .sum();
        sum / neighbors.len() as f64
    }

    /// Fill every NaN cell of `x`, returning a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut result = x.clone();
        let n_features = x.ncols();
        let mut row_buf: Vec<f64> = Vec::with_capacity(n_features);

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            let row_slice = match row.as_slice() {
                Some(s) => s,
                None => {
                    row_buf.clear();
                    row_buf.extend(row.iter().copied());
                    &row_buf
                }
            };

            let neighbors = self.find_neighbors(row_slice);
            for j in 0..n_features {
                if is_missing(row_slice[j]) {
                    result[[row_idx, j]] = self.impute_value(&neighbors, j);
                }
            }
        }

        result
    }
}
