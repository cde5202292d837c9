use crate::entropy::{HIGH_ENTROPY, LOW_ENTROPY};
use crate::error::{Result, TridentError};

/// Samples larger than this are skipped
pub const MAX_FILE_SIZE: u64 = 512 * 1024 * 1024; // 512MB
/// Files handed to the worker pool at once; results of a chunk are written in input order
pub const DEFAULT_CHUNK_SIZE: usize = 64;
/// A section whose virtual size exceeds this multiple of its raw size is flagged
pub const VIRTUAL_RAW_RATIO: u64 = 10;
/// Upper bound (exclusive) of generated trial seeds
pub const DEFAULT_MAX_SEED: u64 = 10_000_000;
/// Repeated trials per run
pub const DEFAULT_SPLITS: usize = 30;
/// Share of each sample used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.9;

/// Configuration for batch feature extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Section entropy at or below this sets `LowEntropy`
    pub low_entropy: f64,
    /// Section entropy at or above this sets `HighEntropy`
    pub high_entropy: f64,
    pub virtual_raw_ratio: u64,
    pub max_file_size: u64,
    /// Worker threads; 0 uses the rayon default
    pub jobs: usize,
    pub chunk_size: usize,
    /// Skip byte-identical samples already seen in the batch
    pub dedupe: bool,
    pub follow_symlinks: bool,
    pub scan_hidden_files: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            low_entropy: LOW_ENTROPY,
            high_entropy: HIGH_ENTROPY,
            virtual_raw_ratio: VIRTUAL_RAW_RATIO,
            max_file_size: MAX_FILE_SIZE,
            jobs: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dedupe: false,
            follow_symlinks: false, // Security: don't follow symlinks by default
            scan_hidden_files: false,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return errors for invalid settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=8.0).contains(&self.low_entropy) || !(0.0..=8.0).contains(&self.high_entropy) {
            return Err(TridentError::invalid_argument(
                "entropy thresholds must be within [0, 8]",
            ));
        }
        if self.low_entropy >= self.high_entropy {
            return Err(TridentError::invalid_argument(
                "low entropy threshold must be below the high threshold",
            ));
        }
        if self.virtual_raw_ratio == 0 {
            return Err(TridentError::invalid_argument(
                "virtual_raw_ratio must be greater than 0",
            ));
        }
        if self.max_file_size == 0 {
            return Err(TridentError::invalid_argument(
                "max_file_size must be greater than 0",
            ));
        }
        if self.chunk_size == 0 {
            return Err(TridentError::invalid_argument("chunk_size must be greater than 0"));
        }
        Ok(())
    }
}

/// Configuration for repeated train/test trials
#[derive(Debug, Clone, PartialEq)]
pub struct TrialConfig {
    pub seed: u64,
    pub num_samples: usize,
    /// Malicious fraction for (training, test); `None` draws records without
    /// stratification
    pub prevalence: Option<(f64, f64)>,
    pub splits: usize,
    pub train_fraction: f64,
    /// Beta of the F-beta score
    pub beta: f64,
    pub max_seed: u64,
}

impl TrialConfig {
    pub fn new(seed: u64, num_samples: usize, prevalence: (f64, f64)) -> Self {
        Self {
            seed,
            num_samples,
            prevalence: Some(prevalence),
            splits: DEFAULT_SPLITS,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            beta: 1.0,
            max_seed: DEFAULT_MAX_SEED,
        }
    }

    /// Trials drawing records regardless of class
    pub fn unstratified(seed: u64, num_samples: usize) -> Self {
        Self { prevalence: None, ..Self::new(seed, num_samples, (0.0, 0.0)) }
    }

    /// Training and test sizes: `round(fraction * n)` and the remainder
    pub fn sample_sizes(&self) -> (usize, usize) {
        let train = (self.train_fraction * self.num_samples as f64).round() as usize;
        let train = train.min(self.num_samples);
        (train, self.num_samples - train)
    }

    pub fn validate(&self) -> Result<()> {
        if self.splits == 0 {
            return Err(TridentError::invalid_argument("splits must be greater than 0"));
        }
        if self.num_samples == 0 {
            return Err(TridentError::invalid_argument(
                "num_samples must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(TridentError::invalid_argument(
                "train_fraction must be within [0, 1]",
            ));
        }
        if !(self.beta > 0.0) {
            return Err(TridentError::invalid_argument("beta must be positive"));
        }
        if self.max_seed == 0 {
            return Err(TridentError::invalid_argument("max_seed must be greater than 0"));
        }
        if let Some((train, test)) = self.prevalence {
            for p in [train, test] {
                if !(0.0..=1.0).contains(&p) {
                    return Err(TridentError::InvalidPrevalence { value: p });
                }
            }
        }
        let (train, test) = self.sample_sizes();
        if train == 0 || test == 0 {
            return Err(TridentError::invalid_argument(format!(
                "num_samples {} leaves an empty training or test partition",
                self.num_samples
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_validation() {
        assert!(ScanConfig::default().validate().is_ok());

        let bad = ScanConfig { max_file_size: 0, ..ScanConfig::default() };
        assert!(bad.validate().is_err());

        let inverted = ScanConfig { low_entropy: 7.5, high_entropy: 7.0, ..ScanConfig::default() };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_trial_sample_sizes() {
        let config = TrialConfig::new(1, 1000, (0.5, 0.1));
        assert_eq!(config.sample_sizes(), (900, 100));

        // 0.9 * 15 = 13.5 rounds away from zero
        let config = TrialConfig::new(1, 15, (0.5, 0.5));
        assert_eq!(config.sample_sizes(), (14, 1));
    }

    #[test]
    fn test_trial_config_validation() {
        assert!(TrialConfig::new(1, 100, (0.5, 0.5)).validate().is_ok());
        assert!(TrialConfig::new(1, 100, (1.5, 0.5)).validate().is_err());
        assert!(TrialConfig::new(1, 1, (0.5, 0.5)).validate().is_err());

        assert!(TrialConfig::unstratified(1, 100).validate().is_ok());
        assert_eq!(TrialConfig::unstratified(1, 100).prevalence, None);

        let mut config = TrialConfig::new(1, 100, (0.5, 0.5));
        config.splits = 0;
        assert!(config.validate().is_err());
    }
}
