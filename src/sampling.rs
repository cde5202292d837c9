//! Reproducible stratified sampling of feature databases.
//!
//! Every function here is pure: the explicit seed is the only source of
//! randomness, so the same inputs always produce the same index sets.
//!
//! Prevalence counts round half away from zero (`f64::round`): a request of
//! 25% of 10 records selects 3 malicious records, not 2.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Result, TridentError};

/// One train/test partition of record indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Draw `count` seeds in `[0, max_value)` from a generator seeded with `origin_seed`.
pub fn gen_seeds(origin_seed: u64, count: usize, max_value: u64) -> Result<Vec<u64>> {
    if max_value == 0 {
        return Err(TridentError::invalid_argument("max_value must be greater than 0"));
    }
    let mut rng = StdRng::seed_from_u64(origin_seed);
    Ok((0..count).map(|_| rng.gen_range(0..max_value)).collect())
}

/// Number of malicious records for a partition of size `n`
pub fn malicious_count(prevalence: f64, n: usize) -> usize {
    (prevalence * n as f64).round() as usize
}

fn check_prevalence(p: f64) -> Result<()> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(TridentError::InvalidPrevalence { value: p })
    }
}

/// Indices of label 1 and label 0 records, ascending. Other labels are never sampled.
fn class_pools(labels: &[i64]) -> (Vec<usize>, Vec<usize>) {
    let mut malicious = Vec::new();
    let mut benign = Vec::new();
    for (idx, &label) in labels.iter().enumerate() {
        match label {
            1 => malicious.push(idx),
            0 => benign.push(idx),
            _ => {}
        }
    }
    (malicious, benign)
}

/// Split record indices into disjoint training and test sets honoring the
/// requested sizes and malicious fractions.
pub fn train_test_split(
    seed: u64,
    labels: &[i64],
    sample_sizes: (usize, usize),
    prevalence: (f64, f64),
) -> Result<Split> {
    let (n_train, n_test) = sample_sizes;
    let (p_train, p_test) = prevalence;

    let requested = n_train.saturating_add(n_test);
    if requested > labels.len() {
        return Err(TridentError::insufficient_data(format!(
            "requested {} records but only {} are available",
            requested,
            labels.len()
        )));
    }
    check_prevalence(p_train)?;
    check_prevalence(p_test)?;

    let mal_train = malicious_count(p_train, n_train);
    let mal_test = malicious_count(p_test, n_test);
    let ben_train = n_train - mal_train;
    let ben_test = n_test - mal_test;

    let (mut malicious, mut benign) = class_pools(labels);

    if malicious.len() < mal_train + mal_test {
        return Err(TridentError::insufficient_data(format!(
            "need {} malicious records but only {} are available",
            mal_train + mal_test,
            malicious.len()
        )));
    }
    if benign.len() < ben_train + ben_test {
        return Err(TridentError::insufficient_data(format!(
            "need {} benign records but only {} are available",
            ben_train + ben_test,
            benign.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    malicious.shuffle(&mut rng);
    benign.shuffle(&mut rng);

    // Test slices continue where training stopped, so no record lands in both
    let mut train: Vec<usize> = malicious[..mal_train]
        .iter()
        .chain(&benign[..ben_train])
        .copied()
        .collect();
    let mut test: Vec<usize> = malicious[mal_train..mal_train + mal_test]
        .iter()
        .chain(&benign[ben_train..ben_train + ben_test])
        .copied()
        .collect();

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    debug!(
        seed,
        train = train.len(),
        test = test.len(),
        mal_train,
        mal_test,
        "generated split"
    );

    Ok(Split { train, test })
}

/// One split per seed, in seed order.
pub fn gen_splits(
    seeds: &[u64],
    labels: &[i64],
    sample_sizes: (usize, usize),
    prevalence: (f64, f64),
) -> Result<Vec<Split>> {
    seeds
        .iter()
        .map(|&seed| train_test_split(seed, labels, sample_sizes, prevalence))
        .collect()
}

/// Draw a single sample of `n` labelled records.
///
/// With a malicious fraction the sample is stratified like the training half
/// of [`train_test_split`]; without one, labelled records are drawn uniformly.
pub fn select_sample(
    seed: u64,
    labels: &[i64],
    n: usize,
    malfrac: Option<f64>,
) -> Result<Vec<usize>> {
    match malfrac {
        Some(p) => Ok(train_test_split(seed, labels, (n, 0), (p, 0.0))?.train),
        None => {
            let (malicious, benign) = class_pools(labels);
            let mut pool: Vec<usize> = malicious.into_iter().chain(benign).collect();
            if n > pool.len() {
                return Err(TridentError::insufficient_data(format!(
                    "requested {} records but only {} labelled records are available",
                    n,
                    pool.len()
                )));
            }
            pool.sort_unstable();
            let mut rng = StdRng::seed_from_u64(seed);
            pool.shuffle(&mut rng);
            pool.truncate(n);
            Ok(pool)
        }
    }
}

/// Split record indices into disjoint training and test sets of the requested
/// sizes, drawing labelled records regardless of class.
pub fn random_split(seed: u64, labels: &[i64], sample_sizes: (usize, usize)) -> Result<Split> {
    let (n_train, n_test) = sample_sizes;
    let mut train = select_sample(seed, labels, n_train.saturating_add(n_test), None)?;
    let test = train.split_off(n_train);
    Ok(Split { train, test })
}
