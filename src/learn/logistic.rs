use super::{check_training, check_width, not_fitted, Classifier};
use crate::error::{Result, TridentError};

const DEFAULT_LEARNING_RATE: f64 = 0.5;
const DEFAULT_ITERATIONS: usize = 500;
const DEFAULT_L2: f64 = 1e-4;

#[derive(Debug, Clone)]
struct Fitted {
    /// Per-feature standardization
    mean: Vec<f64>,
    scale: Vec<f64>,
    weights: Vec<f64>,
    bias: f64,
}

/// Binary logistic regression trained by batch gradient descent on
/// standardized features. Labels must be 0 or 1.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    learning_rate: f64,
    iterations: usize,
    l2: f64,
    fitted: Option<Fitted>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            iterations: DEFAULT_ITERATIONS,
            l2: DEFAULT_L2,
            fitted: None,
        }
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Probability of label 1 for each row
    pub fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or_else(not_fitted)?;
        check_width(features, fitted.weights.len())?;
        Ok(features
            .iter()
            .map(|row| sigmoid(fitted.linear(&fitted.standardize(row))))
            .collect())
    }
}

impl Fitted {
    fn standardize(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    fn linear(&self, row: &[f64]) -> f64 {
        self.bias + row.iter().zip(&self.weights).map(|(x, w)| x * w).sum::<f64>()
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[i64]) -> Result<()> {
        let width = check_training(features, labels)?;
        if let Some(bad) = labels.iter().find(|&&l| l != 0 && l != 1) {
            return Err(TridentError::invalid_argument(format!(
                "logistic regression needs 0/1 labels, found {bad}"
            )));
        }

        let n = features.len() as f64;
        let mut mean = vec![0.0; width];
        for row in features {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut scale = vec![0.0; width];
        for row in features {
            for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        // Constant columns keep a unit scale
        scale.iter_mut().for_each(|s| *s = if *s > 0.0 { s.sqrt() } else { 1.0 });

        let mut model = Fitted { mean, scale, weights: vec![0.0; width], bias: 0.0 };
        let x: Vec<Vec<f64>> = features.iter().map(|row| model.standardize(row)).collect();
        let y: Vec<f64> = labels.iter().map(|&l| l as f64).collect();

        for _ in 0..self.iterations {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, target) in x.iter().zip(&y) {
                let err = sigmoid(model.linear(row)) - target;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= self.learning_rate * (g / n + self.l2 * *w);
            }
            model.bias -= self.learning_rate * grad_b / n;
        }

        self.fitted = Some(model);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| i64::from(p >= 0.5))
            .collect())
    }
}
