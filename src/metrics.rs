//! Scores of binary predictions. The positive class is label 1.

use serde::Serialize;

use crate::error::{Result, TridentError};

/// Prediction counts against the true labels
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl Confusion {
    pub fn from_predictions(predicted: &[i64], truth: &[i64]) -> Result<Self> {
        if predicted.len() != truth.len() {
            return Err(TridentError::invalid_argument(format!(
                "{} predictions for {} labels",
                predicted.len(),
                truth.len()
            )));
        }
        if predicted.is_empty() {
            return Err(TridentError::invalid_argument("no predictions to score"));
        }

        let mut c = Self::default();
        for (&p, &t) in predicted.iter().zip(truth) {
            match (p == 1, t == 1) {
                (true, true) => c.true_positive += 1,
                (true, false) => c.false_positive += 1,
                (false, false) => c.true_negative += 1,
                (false, true) => c.false_negative += 1,
            }
        }
        Ok(c)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn fbeta(&self, beta: f64) -> f64 {
        let p = self.precision();
        let r = self.recall();
        let b2 = beta * beta;
        let denom = b2 * p + r;
        if denom == 0.0 {
            0.0
        } else {
            (1.0 + b2) * p * r / denom
        }
    }
}

/// `num / denom`, or 0 when nothing was counted
fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Fraction of predictions equal to the true label (any label values)
pub fn accuracy(predicted: &[i64], truth: &[i64]) -> Result<f64> {
    // Validates lengths
    let c = Confusion::from_predictions(predicted, truth)?;
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(ratio(correct, c.total()))
}

pub fn precision(predicted: &[i64], truth: &[i64]) -> Result<f64> {
    Ok(Confusion::from_predictions(predicted, truth)?.precision())
}

pub fn recall(predicted: &[i64], truth: &[i64]) -> Result<f64> {
    Ok(Confusion::from_predictions(predicted, truth)?.recall())
}

pub fn fbeta(predicted: &[i64], truth: &[i64], beta: f64) -> Result<f64> {
    Ok(Confusion::from_predictions(predicted, truth)?.fbeta(beta))
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// A performance measure reported by trials
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Accuracy,
    Precision,
    Recall,
    FBeta(f64),
}

impl Measure {
    /// The measures of a trial, in report order
    pub fn all(beta: f64) -> [Measure; 4] {
        [Measure::Accuracy, Measure::Precision, Measure::Recall, Measure::FBeta(beta)]
    }

    pub fn name(&self) -> String {
        match self {
            Measure::Accuracy => "accuracy".to_string(),
            Measure::Precision => "precision".to_string(),
            Measure::Recall => "recall".to_string(),
            Measure::FBeta(beta) => format!("f-{beta}"),
        }
    }

    pub fn score(&self, predicted: &[i64], truth: &[i64]) -> Result<f64> {
        match self {
            Measure::Accuracy => accuracy(predicted, truth),
            Measure::Precision => precision(predicted, truth),
            Measure::Recall => recall(predicted, truth),
            Measure::FBeta(beta) => fbeta(predicted, truth, *beta),
        }
    }
}
