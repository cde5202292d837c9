use std::collections::BTreeMap;

use super::{check_training, check_width, not_fitted, Classifier};
use crate::error::Result;

const DEFAULT_MAX_DEPTH: usize = 16;
const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone)]
enum Node {
    Leaf(i64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART classification tree with Gini impurity.
///
/// Rows with `feature <= threshold` go left. Thresholds are midpoints between
/// consecutive distinct values.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    max_depth: usize,
    min_samples_split: usize,
    nodes: Vec<Node>,
    width: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn class_counts(labels: &[i64], idx: &[usize]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &i in idx {
        *counts.entry(labels[i]).or_insert(0) += 1;
    }
    counts
}

fn gini(counts: &BTreeMap<i64, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.values().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

/// Most frequent label; ties keep the smallest
fn majority(counts: &BTreeMap<i64, usize>) -> i64 {
    counts
        .iter()
        .fold((0, 0), |best, (&label, &count)| {
            if count > best.1 {
                (label, count)
            } else {
                best
            }
        })
        .0
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            nodes: Vec::new(),
            width: 0,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn best_split(&self, x: &[Vec<f64>], y: &[i64], idx: &[usize]) -> Option<Candidate> {
        let total = idx.len();
        let mut best: Option<Candidate> = None;

        for feature in 0..self.width {
            let mut order = idx.to_vec();
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left: BTreeMap<i64, usize> = BTreeMap::new();
            let mut right = class_counts(y, &order);

            for pos in 0..total - 1 {
                let i = order[pos];
                *left.entry(y[i]).or_insert(0) += 1;
                if let Some(c) = right.get_mut(&y[i]) {
                    *c -= 1;
                }

                let here = x[i][feature];
                let next = x[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = total - n_left;
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Candidate { feature, threshold: here + (next - here) / 2.0, impurity });
                }
            }
        }
        best
    }

    fn grow(&mut self, x: &[Vec<f64>], y: &[i64], idx: Vec<usize>, depth: usize) -> usize {
        let counts = class_counts(y, &idx);
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf(majority(&counts)));

        if counts.len() < 2 || depth >= self.max_depth || idx.len() < self.min_samples_split {
            return slot;
        }

        // Zero-gain splits are allowed
        let Some(split) = self.best_split(x, y, &idx) else {
            return slot;
        };

        let (l, r): (Vec<usize>, Vec<usize>) =
            idx.into_iter().partition(|&i| x[i][split.feature] <= split.threshold);
        let left = self.grow(x, y, l, depth + 1);
        let right = self.grow(x, y, r, depth + 1);
        self.nodes[slot] = Node::Split { feature: split.feature, threshold: split.threshold, left, right };
        slot
    }

    fn predict_row(&self, row: &[f64]) -> i64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf(label) => return *label,
                Node::Split { feature, threshold, left, right } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[i64]) -> Result<()> {
        self.width = check_training(features, labels)?;
        self.nodes.clear();
        self.grow(features, labels, (0..features.len()).collect(), 0);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>> {
        if self.nodes.is_empty() {
            return Err(not_fitted());
        }
        check_width(features, self.width)?;
        Ok(features.iter().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learns_xor() {
        let x = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let y = vec![0, 1, 1, 0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let x = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let y = vec![0, 1, 1, 0];
        let mut stump = DecisionTree::new().with_max_depth(0);
        stump.fit(&x, &y).unwrap();
        assert_eq!(stump.depth(), 0);
        // Tie between the classes keeps label 0
        assert_eq!(stump.predict(&x).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let mut tree = DecisionTree::new();
        tree.fit(&[vec![1.0], vec![2.0]], &[1, 1]).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&[vec![-5.0]]).unwrap(), vec![1]);
    }

    #[test]
    fn test_midpoint_threshold() {
        let mut tree = DecisionTree::new();
        tree.fit(&[vec![1.0], vec![3.0]], &[0, 1]).unwrap();
        assert_eq!(tree.predict(&[vec![1.9], vec![2.0], vec![2.1]]).unwrap(), vec![0, 0, 1]);
    }
}
