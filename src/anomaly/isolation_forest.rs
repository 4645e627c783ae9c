//! Isolation forest anomaly scoring for a single numeric column

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Isolation tree node over scalar values
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsolationTree {
    /// Internal node with split
    Internal {
        /// Split threshold
        threshold: f64,
        /// Left subtree (values < threshold)
        left: Box<IsolationTree>,
        /// Right subtree (values >= threshold)
        right: Box<IsolationTree>,
    },
    /// External (leaf) node
    External {
        /// Number of samples in this node
        size: usize,
    },
}

impl IsolationTree {
    fn build(
        values: &[f64],
        indices: &[usize],
        height: usize,
        max_height: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();

        if height >= max_height || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        let min_val = indices.iter().map(|&i| values[i]).fold(f64::INFINITY, f64::min);
        let max_val = indices
            .iter()
            .map(|&i| values[i])
            .fold(f64::NEG_INFINITY, f64::max);

        // All values the same: nothing left to isolate
        if (max_val - min_val).abs() < 1e-10 {
            return IsolationTree::External { size: n_samples };
        }

        let threshold = rng.gen_range(min_val..max_val);

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| values[i] < threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        let left = Box::new(Self::build(values, &left_indices, height + 1, max_height, rng));
        let right = Box::new(Self::build(values, &right_indices, height + 1, max_height, rng));

        IsolationTree::Internal {
            threshold,
            left,
            right,
        }
    }

    fn path_length(&self, value: f64, current_height: usize) -> f64 {
        match self {
            IsolationTree::External { size } => current_height as f64 + Self::c(*size),
            IsolationTree::Internal {
                threshold,
                left,
                right,
            } => {
                if value < *threshold {
                    left.path_length(value, current_height + 1)
                } else {
                    right.path_length(value, current_height + 1)
                }
            }
        }
    }

    /// Average path length of unsuccessful search in BST
    /// c(n) = 2 * H(n-1) - 2(n-1)/n for n > 2
    fn c(n: usize) -> f64 {
        if n <= 1 {
            0.0
        } else if n == 2 {
            1.0
        } else {
            let n_f = n as f64;
            2.0 * (n_f - 1.0).ln() + 0.5772156649 - 2.0 * (n_f - 1.0) / n_f
        }
    }
}

/// Seeded isolation forest over one column's non-missing values.
///
/// The ensemble is rebuilt on every [`score`](Self::score) call; the seed
/// makes repeated runs over the same values identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    /// Create a forest with the given contamination ratio
    pub fn new(contamination: f64) -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: contamination.clamp(0.0, 0.5),
            seed: 42,
        }
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    /// Set maximum samples per tree
    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(1);
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Anomaly score per value, between 0 and 1; higher is more anomalous.
    ///
    /// s(x, n) = 2^(-E[h(x)] / c(n)) where h is the path length.
    pub fn score(&self, values: &[f64]) -> Vec<f64> {
        let n_samples = values.len();
        if n_samples == 0 {
            return Vec::new();
        }

        let samples_per_tree = self.max_samples.min(n_samples);
        let max_height = (samples_per_tree as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            // Sample indices with replacement
            let indices: Vec<usize> = (0..samples_per_tree)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();
            trees.push(IsolationTree::build(values, &indices, 0, max_height, &mut rng));
        }

        let c_n = IsolationTree::c(samples_per_tree);
        values
            .iter()
            .map(|&v| {
                let avg_path: f64 = trees
                    .iter()
                    .map(|tree| tree.path_length(v, 0))
                    .sum::<f64>()
                    / trees.len() as f64;
                2.0_f64.powf(-avg_path / c_n)
            })
            .collect()
    }

    /// Flag the `round(contamination * n)` highest-scoring values.
    ///
    /// Count-based thresholding rather than a score cutoff: score ties
    /// cannot change how many values are flagged, so a fixed seed yields a
    /// fixed outlier set.
    pub fn flag(&self, values: &[f64]) -> Vec<bool> {
        let n = values.len();
        let n_outliers = ((self.contamination * n as f64).round() as usize).min(n);

        let mut flags = vec![false; n];
        if n_outliers == 0 {
            return flags;
        }

        let scores = self.score(values);
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        for &i in order.iter().take(n_outliers) {
            flags[i] = true;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlier_scores_higher() {
        let mut values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        values.push(100.0);

        let forest = IsolationForest::new(0.05).with_n_estimators(50).with_seed(42);
        let scores = forest.score(&values);

        let max_inlier = scores[..50].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(scores[50] > max_inlier, "extreme value should score highest");
    }

    #[test]
    fn test_flag_count_matches_contamination() {
        let mut values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        values.push(1000.0);

        let forest = IsolationForest::new(1.0 / 21.0).with_seed(42);
        let flags = forest.flag(&values);

        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        assert!(flags[20], "the extreme value should be the flagged one");
    }

    #[test]
    fn test_zero_contamination_flags_nothing() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let forest = IsolationForest::new(0.0).with_seed(42);
        assert!(forest.flag(&values).iter().all(|&f| !f));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let values: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 50.0, 5.0, 6.0];
        let forest = IsolationForest::new(0.2).with_seed(7);
        assert_eq!(forest.score(&values), forest.score(&values));
        assert_eq!(forest.flag(&values), forest.flag(&values));
    }

    #[test]
    fn test_empty_input() {
        let forest = IsolationForest::new(0.1);
        assert!(forest.score(&[]).is_empty());
        assert!(forest.flag(&[]).is_empty());
    }
}
