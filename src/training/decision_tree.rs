//! Regression tree

use crate::error::{EstimatorError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the mean target of its samples
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Reduction in sum of squared errors
    gain: f64,
}

/// Regression tree split on squared-error reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Number of features drawn at random at every split (all when `None`)
    pub max_features: Option<usize>,
    /// Seed for feature sampling when fitted through [`DecisionTree::fit`]
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_regressor()
    }
}

impl DecisionTree {
    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Consider only `n` randomly drawn features per split
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        self.fit_with_rng(x, y, &mut rng)
    }

    /// Fit drawing split features from the caller's generator
    pub fn fit_with_rng<R: RngCore>(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut R,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(EstimatorError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 {
            return Err(EstimatorError::Data("cannot fit a tree on zero rows".to_string()));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree<R: RngCore>(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut R,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let leaf = TreeNode::Leaf {
            value: sum / n_samples as f64,
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);

        if should_stop {
            return leaf;
        }

        let parent_sse = sse(n_samples, sum, sq_sum);
        let features = self.sample_features(x, indices, rng);

        let Some(best) = self.find_best_split(x, y, indices, &features, parent_sse) else {
            return leaf;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: parent_sse / n_samples as f64,
        }
    }

    /// Candidate features for one split, in ascending order
    ///
    /// Features are drawn from a shuffled order until `max_features` of them
    /// vary within the node; constant features do not count towards the limit.
    fn sample_features<R: RngCore>(
        &self,
        x: &Array2<f64>,
        indices: &[usize],
        rng: &mut R,
    ) -> Vec<usize> {
        let n_features = x.ncols();
        let k = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        if k >= n_features {
            return (0..n_features).collect();
        }

        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(rng);

        let mut picked = Vec::with_capacity(k);
        for feature_idx in order {
            if !is_constant(x, indices, feature_idx) {
                picked.push(feature_idx);
                if picked.len() == k {
                    break;
                }
            }
        }
        picked.sort_unstable();
        picked
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let min_gain = 1e-12 * parent_sse.max(1.0);

        // Each feature finds its own best threshold; results keep feature order
        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                self.best_split_for_feature(x.column(feature_idx), y, indices, feature_idx, parent_sse)
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .filter(|c| c.gain > min_gain)
            .fold(None, |best: Option<SplitCandidate>, c| match best {
                Some(b) if b.gain >= c.gain => Some(b),
                _ => Some(c),
            })
    }

    /// Sweep the sorted feature values once, keeping running sums on the left
    fn best_split_for_feature(
        &self,
        column: ArrayView1<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let mut order: Vec<(f64, f64)> = indices.iter().map(|&i| (column[i], y[i])).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = order.iter().map(|(_, t)| t).sum();
        let total_sq: f64 = order.iter().map(|(_, t)| t * t).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let (value, target) = order[pos];
            left_sum += target;
            left_sq += target * target;

            let next_value = order[pos + 1].0;
            if next_value <= value {
                continue;
            }

            let left_count = pos + 1;
            let right_count = n - left_count;
            if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                continue;
            }

            let children_sse = sse(left_count, left_sum, left_sq)
                + sse(right_count, total_sum - left_sum, total_sq - left_sq);
            let gain = parent_sse - children_sse;

            if best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: (value + next_value) / 2.0,
                    gain,
                });
            }
        }

        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(EstimatorError::NotFitted)?;

        if x.ncols() != self.n_features {
            return Err(EstimatorError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| predict_sample(root, row)).collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }
}

fn predict_sample(root: &TreeNode, sample: ArrayView1<f64>) -> f64 {
    let mut node = root;
    loop {
        match node {
            TreeNode::Leaf { value, .. } => return *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                node = if sample[*feature_idx] <= *threshold { &**left } else { &**right };
            }
        }
    }
}

fn sse(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sq_sum - sum * sum / count as f64).max(0.0)
}

fn is_constant(x: &Array2<f64>, indices: &[usize], feature_idx: usize) -> bool {
    let first = x[[indices[0], feature_idx]];
    indices.iter().all(|&i| x[[i, feature_idx]] == first)
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| y[i] == first)
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTree::new_regressor().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_single_sample_is_leaf() {
        let x = array![[3.0, 1.0]];
        let y = array![42.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_n_leaves(), 1);
        assert_eq!(tree.predict(&array![[0.0, 0.0]]).unwrap()[0], 42.0);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 10.0];

        let mut tree = DecisionTree::new_regressor().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();

        let err = tree.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, EstimatorError::Shape { .. }));
    }

    #[test]
    fn test_unfitted_predict() {
        let tree = DecisionTree::new_regressor();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(EstimatorError::NotFitted)));
    }

    #[test]
    fn test_constant_feature_does_not_stop_growth() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        for seed in 0..20 {
            let mut tree = DecisionTree::new_regressor()
                .with_max_features(1)
                .with_random_state(seed);
            tree.fit(&x, &y).unwrap();

            assert_eq!(tree.get_n_leaves(), 4, "seed {}", seed);
            assert_eq!(tree.predict(&x).unwrap(), y);
        }
    }

    #[test]
    fn test_sampled_features_skip_constant_columns() {
        let x = array![[0.0, 1.0, 5.0], [0.0, 2.0, 5.0], [0.0, 3.0, 5.0]];
        let tree = DecisionTree::new_regressor().with_max_features(2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(tree.sample_features(&x, &[0, 1, 2], &mut rng), vec![1]);
    }
}
