//! Classifiers used by trials.
//!
//! Every algorithm implements [`Classifier`] and is registered by its short
//! name in [`ALGORITHMS`].

pub mod decision_tree;
pub mod logistic;
pub mod naive_bayes;

use crate::error::{Result, TridentError};

pub use decision_tree::DecisionTree;
pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;

/// A supervised classifier over dense numeric features
pub trait Classifier: Send {
    /// Train on `features` (one row per record) and their labels
    fn fit(&mut self, features: &[Vec<f64>], labels: &[i64]) -> Result<()>;

    /// Predict one label per row. Fails when called before `fit`.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>>;
}

pub struct Algorithm {
    pub name: &'static str,
    pub description: &'static str,
    constructor: fn() -> Box<dyn Classifier>,
}

impl Algorithm {
    pub fn create(&self) -> Box<dyn Classifier> {
        (self.constructor)()
    }
}

fn naive_bayes_model() -> Box<dyn Classifier> {
    Box::new(GaussianNaiveBayes::new())
}

fn decision_tree_model() -> Box<dyn Classifier> {
    Box::new(DecisionTree::new())
}

fn logistic_model() -> Box<dyn Classifier> {
    Box::new(LogisticRegression::new())
}

pub static ALGORITHMS: &[Algorithm] = &[
    Algorithm {
        name: "nb",
        description: "Gaussian naive Bayes",
        constructor: naive_bayes_model,
    },
    Algorithm {
        name: "dt",
        description: "CART decision tree",
        constructor: decision_tree_model,
    },
    Algorithm {
        name: "lr",
        description: "logistic regression",
        constructor: logistic_model,
    },
];

/// Look up an algorithm by its short name
pub fn algorithm(name: &str) -> Result<&'static Algorithm> {
    ALGORITHMS
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| TridentError::unknown_algorithm(name))
}

pub fn algorithm_names() -> Vec<&'static str> {
    ALGORITHMS.iter().map(|a| a.name).collect()
}

/// Check a training set and return its feature width
pub(crate) fn check_training(features: &[Vec<f64>], labels: &[i64]) -> Result<usize> {
    if features.is_empty() {
        return Err(TridentError::insufficient_data("empty training set"));
    }
    if features.len() != labels.len() {
        return Err(TridentError::invalid_argument(format!(
            "{} training rows for {} labels",
            features.len(),
            labels.len()
        )));
    }
    check_width(features, features[0].len())?;
    Ok(features[0].len())
}

/// Every row must have `width` columns
pub(crate) fn check_width(features: &[Vec<f64>], width: usize) -> Result<()> {
    match features.iter().position(|row| row.len() != width) {
        Some(i) => Err(TridentError::invalid_argument(format!(
            "row {} has {} features, expected {}",
            i,
            features[i].len(),
            width
        ))),
        None => Ok(()),
    }
}

pub(crate) fn not_fitted() -> TridentError {
    TridentError::invalid_argument("classifier used before fit")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two well separated clusters: label 1 around (5, 5), label 0 around (0, 0)
    pub(crate) fn clusters() -> (Vec<Vec<f64>>, Vec<i64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            x.push(vec![jitter, 0.2 - jitter]);
            y.push(0);
            x.push(vec![5.0 + jitter, 5.0 - jitter]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_registry() {
        assert_eq!(algorithm_names(), vec!["nb", "dt", "lr"]);
        assert!(matches!(
            algorithm("svm"),
            Err(TridentError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_every_algorithm_separates_clusters() {
        let (x, y) = clusters();
        for algo in ALGORITHMS {
            let mut model = algo.create();
            assert!(model.predict(&x).is_err(), "{} predicted before fit", algo.name);
            model.fit(&x, &y).unwrap();
            let pred = model.predict(&[vec![0.1, 0.1], vec![5.1, 4.9]]).unwrap();
            assert_eq!(pred, vec![0, 1], "{}", algo.name);
        }
    }

    #[test]
    fn test_training_checks() {
        assert!(check_training(&[], &[]).is_err());
        assert!(check_training(&[vec![1.0]], &[1, 0]).is_err());
        assert!(check_training(&[vec![1.0], vec![1.0, 2.0]], &[1, 0]).is_err());
        assert_eq!(check_training(&[vec![1.0, 2.0]], &[1]).unwrap(), 2);
    }
}
