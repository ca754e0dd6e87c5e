//! Random forest regressor: bootstrap-aggregated CART trees fit in parallel.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Hyperparameters of the forest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Depth limit per tree; `None` grows until another stop rule fires.
    pub max_depth: Option<usize>,
    /// A node with fewer samples than this becomes a leaf.
    pub min_samples_split: usize,
    /// Each child of a split keeps at least this many samples.
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree instead of using every row.
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: None,
            min_samples_split: 4,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    fn fit(x: &[Vec<f64>], y: &[f64], samples: Vec<usize>, params: &ForestParams) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        // (node index, samples reaching it, depth)
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((id, samples, depth)) = stack.pop() {
            let mean = samples.iter().map(|&s| y[s]).sum::<f64>() / samples.len() as f64;

            let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
            let pure = samples.iter().all(|&s| y[s] == y[samples[0]]);
            let split = if depth_reached || pure || samples.len() < params.min_samples_split {
                None
            } else {
                best_split(x, y, &samples, params.min_samples_leaf)
            };

            let Some(split) = split else {
                nodes[id] = Node::Leaf { value: mean };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&s| x[s][split.feature] <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        Self { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    // Children always sit after their parent, so a valid tree cannot cycle.
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("node {id}: non-finite leaf value"));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!("node {id}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {id}: non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {id}: child index {child} out of range"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// Minimising child SSE is the same as maximising sum_l^2/n_l + sum_r^2/n_r.
fn best_split(x: &[Vec<f64>], y: &[f64], samples: &[usize], min_leaf: usize) -> Option<BestSplit> {
    let n = samples.len();
    let total: f64 = samples.iter().map(|&s| y[s]).sum();
    let n_features = x[samples[0]].len();
    let mut order = samples.to_vec();
    let mut best: Option<BestSplit> = None;

    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        if x[order[0]][feature] == x[order[n - 1]][feature] {
            continue;
        }

        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += y[order[i]];
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf {
                continue;
            }
            if n_right < min_leaf {
                break;
            }
            let lo = x[order[i]][feature];
            let hi = x[order[i + 1]][feature];
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            if best.as_ref().map_or(true, |b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

/// Ensemble of regression trees; the prediction is the mean of the trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fit a forest on a dense feature matrix.
    ///
    /// # Arguments
    /// * `x` - One row per sample, all of equal width
    /// * `y` - Target per sample
    /// * `params` - Forest hyperparameters
    ///
    /// Trees are fit on the rayon pool and collected in index order, so the
    /// result only depends on the data and `params.seed`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> ModelResult<Self> {
        if x.is_empty() {
            return Err(ModelError::invalid("no training rows"));
        }
        if x.len() != y.len() {
            return Err(ModelError::invalid(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().position(|r| r.len() != n_features) {
            return Err(ModelError::invalid(format!(
                "row {row} has {} features, expected {n_features}",
                x[row].len()
            )));
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(ModelError::invalid("non-finite value in training data"));
        }
        if params.n_trees == 0 {
            return Err(ModelError::invalid("n_trees must be at least 1"));
        }
        if params.min_samples_split < 2 || params.min_samples_leaf < 1 {
            return Err(ModelError::invalid(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1",
            ));
        }

        let n = x.len();
        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let samples = if params.bootstrap {
                    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, samples, &params)
            })
            .collect();

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Predict a single row.
    pub fn predict(&self, row: &[f64]) -> ModelResult<f64> {
        if row.len() != self.n_features {
            return Err(ModelError::FeatureWidth {
                got: row.len(),
                expected: self.n_features,
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Check the structure of a deserialized forest before it is used.
    ///
    /// Rejects an empty ensemble, empty trees, child indices that do not
    /// point forward inside the node array, out-of-range features and
    /// non-finite thresholds or leaf values.
    pub fn validate(&self) -> ModelResult<()> {
        if self.trees.is_empty() {
            return Err(ModelError::IncompatibleArtifact("forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|msg| ModelError::IncompatibleArtifact(format!("tree {t}: {msg}")))?;
        }
        Ok(())
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}
