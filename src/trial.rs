//! Repeated train/test trials of one classifier over a feature database.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TrialConfig;
use crate::database::Database;
use crate::error::Result;
use crate::learn;
use crate::metrics::{self, Measure};
use crate::sampling::{gen_seeds, gen_splits, random_split, Split};

/// Scores of one measure over every split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureSummary {
    pub measure: String,
    pub mean: f64,
    pub std: f64,
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    pub algorithm: String,
    pub seed: u64,
    pub num_samples: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub prevalence: Option<(f64, f64)>,
    pub seeds: Vec<u64>,
    pub measures: Vec<MeasureSummary>,
}

impl TrialReport {
    /// Fixed-width result table, one line per measure
    pub fn table(&self) -> String {
        let mut out = format!("{:>9}  {:>7}  {:>7}  scores\n", "measure", "mean", "std");
        for m in &self.measures {
            let scores: Vec<String> = m.scores.iter().map(|s| format!("{s:.3}")).collect();
            out.push_str(&format!(
                "{:>9}  {:>7.4}  {:>7.4}  {}\n",
                m.measure,
                m.mean,
                m.std,
                scores.join(" ")
            ));
        }
        out
    }
}

/// Gather the rows of `idx`
fn rows(features: &[Vec<f64>], labels: &[i64], idx: &[usize]) -> (Vec<Vec<f64>>, Vec<i64>) {
    idx.iter().map(|&i| (features[i].clone(), labels[i])).unzip()
}

/// Fit on the training partition and return (predictions, truth) on the test partition
fn evaluate_split(
    algorithm: &learn::Algorithm,
    features: &[Vec<f64>],
    labels: &[i64],
    split: &Split,
) -> Result<(Vec<i64>, Vec<i64>)> {
    let (train_x, train_y) = rows(features, labels, &split.train);
    let (test_x, test_y) = rows(features, labels, &split.test);

    let mut model = algorithm.create();
    model.fit(&train_x, &train_y)?;
    let predicted = model.predict(&test_x)?;
    Ok((predicted, test_y))
}

/// Run `config.splits` seeded trials of `algorithm` on `db`
pub fn run_trial(db: &Database, algorithm: &str, config: &TrialConfig) -> Result<TrialReport> {
    config.validate()?;
    let algo = learn::algorithm(algorithm)?;
    let components = db.components()?;

    let seeds = gen_seeds(config.seed, config.splits, config.max_seed)?;
    let sizes = config.sample_sizes();
    let splits = match config.prevalence {
        Some(prevalence) => gen_splits(&seeds, &components.labels, sizes, prevalence)?,
        None => seeds
            .iter()
            .map(|&seed| random_split(seed, &components.labels, sizes))
            .collect::<Result<_>>()?,
    };

    info!(
        "Running {} ({}) on {} splits of {}+{} records",
        algo.name, algo.description, splits.len(), sizes.0, sizes.1
    );

    let outcomes: Vec<(Vec<i64>, Vec<i64>)> = splits
        .par_iter()
        .map(|split| evaluate_split(algo, &components.features, &components.labels, split))
        .collect::<Result<_>>()?;

    let measures = Measure::all(config.beta)
        .iter()
        .map(|measure| -> Result<MeasureSummary> {
            let scores = outcomes
                .iter()
                .map(|(predicted, truth)| measure.score(predicted, truth))
                .collect::<Result<Vec<f64>>>()?;
            let summary = MeasureSummary {
                measure: measure.name(),
                mean: metrics::mean(&scores),
                std: metrics::std_dev(&scores),
                scores,
            };
            debug!("{}: mean {:.4}", summary.measure, summary.mean);
            Ok(summary)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrialReport {
        algorithm: algo.name.to_string(),
        seed: config.seed,
        num_samples: config.num_samples,
        train_size: sizes.0,
        test_size: sizes.1,
        prevalence: config.prevalence,
        seeds,
        measures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TridentError;
    use crate::types::Schema;
    use crate::database::Row;

    /// 60 records, one in three malicious; `f` separates the classes and `g` is constant
    fn separable() -> Database {
        let schema = Schema::from_names(["Name", "f", "g", "isMalware"]).unwrap();
        let rows = (0..60)
            .map(|i| {
                let label = i64::from(i % 3 == 0);
                Row { name: format!("s{i}.exe"), values: vec![label * 10 + i % 2, 4, label] }
            })
            .collect();
        Database::new(schema, rows).unwrap()
    }

    #[test]
    fn test_trial_is_reproducible() {
        let db = separable();
        let mut config = TrialConfig::new(7, 30, (0.5, 0.5));
        config.splits = 4;
        let a = run_trial(&db, "dt", &config).unwrap();
        let b = run_trial(&db, "dt", &config).unwrap();
        assert_eq!(a.seeds, b.seeds);
        assert_eq!(a.measures.len(), 4);
        assert_eq!((a.train_size, a.test_size), (27, 3));
        for (x, y) in a.measures.iter().zip(&b.measures) {
            assert_eq!(x.scores, y.scores);
            assert_eq!(x.scores.len(), 4);
        }
        // Perfectly separable on `f`
        assert_eq!(a.measures[0].mean, 1.0);
        assert_eq!(a.measures[0].std, 0.0);
        assert_eq!(a.measures[3].measure, "f-1");
    }

    #[test]
    fn test_unstratified_trial() {
        let mut config = TrialConfig::unstratified(3, 30);
        config.splits = 3;
        let report = run_trial(&separable(), "nb", &config).unwrap();
        assert_eq!(report.prevalence, None);
        assert_eq!((report.train_size, report.test_size), (27, 3));
        assert_eq!(report.measures[0].scores.len(), 3);
        assert_eq!(report, run_trial(&separable(), "nb", &config).unwrap());
    }

    #[test]
    fn test_unknown_algorithm() {
        let config = TrialConfig::new(7, 30, (0.5, 0.5));
        let err = run_trial(&separable(), "svm", &config).unwrap_err();
        assert!(matches!(err, TridentError::UnknownAlgorithm { .. }));
    }

    #[test]
    fn test_too_many_samples() {
        let config = TrialConfig::new(7, 100, (0.5, 0.5));
        let err = run_trial(&separable(), "nb", &config).unwrap_err();
        assert!(matches!(err, TridentError::InsufficientData { .. }));
    }

    #[test]
    fn test_report_serializes() {
        let mut config = TrialConfig::new(1, 20, (0.25, 0.5));
        config.splits = 2;
        let report = run_trial(&separable(), "lr", &config).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["algorithm"], "lr");
        assert_eq!(json["measures"][1]["measure"], "precision");
        assert!(report.table().starts_with("  measure"));
    }
}
