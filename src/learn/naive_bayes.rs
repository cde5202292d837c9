use super::{check_training, check_width, not_fitted, Classifier};
use crate::error::Result;

/// Share of the largest feature variance added to every class variance
const VAR_SMOOTHING: f64 = 1e-9;

#[derive(Debug, Clone)]
struct ClassStats {
    label: i64,
    log_prior: f64,
    mean: Vec<f64>,
    var: Vec<f64>,
}

/// Gaussian naive Bayes: independent normal likelihood per feature and class
#[derive(Debug, Clone, Default)]
pub struct GaussianNaiveBayes {
    classes: Vec<ClassStats>,
}

fn column_stats(rows: &[&Vec<f64>], width: usize) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len() as f64;
    let mut mean = vec![0.0; width];
    for row in rows {
        for (m, v) in mean.iter_mut().zip(row.iter()) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut var = vec![0.0; width];
    for row in rows {
        for ((s, v), m) in var.iter_mut().zip(row.iter()).zip(&mean) {
            *s += (v - m).powi(2);
        }
    }
    var.iter_mut().for_each(|s| *s /= n);
    (mean, var)
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    fn joint_log_likelihood(&self, row: &[f64]) -> impl Iterator<Item = (i64, f64)> + '_ {
        let row = row.to_vec();
        self.classes.iter().map(move |c| {
            let ll: f64 = row
                .iter()
                .zip(c.mean.iter().zip(&c.var))
                .map(|(x, (m, v))| {
                    -0.5 * (2.0 * std::f64::consts::PI * v).ln() - (x - m).powi(2) / (2.0 * v)
                })
                .sum();
            (c.label, c.log_prior + ll)
        })
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[i64]) -> Result<()> {
        let width = check_training(features, labels)?;

        let all: Vec<&Vec<f64>> = features.iter().collect();
        let (_, overall_var) = column_stats(&all, width);
        let epsilon = (VAR_SMOOTHING * overall_var.iter().cloned().fold(0.0, f64::max)).max(f64::EPSILON);

        let mut labels_sorted: Vec<i64> = labels.to_vec();
        labels_sorted.sort_unstable();
        labels_sorted.dedup();

        let n = features.len() as f64;
        self.classes = labels_sorted
            .into_iter()
            .map(|label| {
                let rows: Vec<&Vec<f64>> = features
                    .iter()
                    .zip(labels)
                    .filter(|(_, l)| **l == label)
                    .map(|(row, _)| row)
                    .collect();
                let (mean, mut var) = column_stats(&rows, width);
                var.iter_mut().for_each(|v| *v += epsilon);
                ClassStats { label, log_prior: (rows.len() as f64 / n).ln(), mean, var }
            })
            .collect();
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>> {
        let Some(first) = self.classes.first() else {
            return Err(not_fitted());
        };
        check_width(features, first.mean.len())?;

        Ok(features
            .iter()
            .map(|row| {
                // Ties keep the smallest label
                self.joint_log_likelihood(row)
                    .fold((first.label, f64::NEG_INFINITY), |best, cand| {
                        if cand.1 > best.1 {
                            cand
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }
}
