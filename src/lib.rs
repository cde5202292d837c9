//! trident - PE header feature extraction and reproducible stratified
//! train/test splits for malware classification experiments.
//!
//! The crate turns a set of Windows binaries into a CSV feature database
//! ([`Scanner`] with [`PeAnalyzer`]), draws seeded train/test partitions with
//! fixed class prevalence ([`sampling`]) and evaluates simple classifiers over
//! those partitions ([`run_trial`]).
//!
//! # Example
//!
//! ```no_run
//! use trident::{Database, TrialConfig, run_trial};
//!
//! let db = Database::load("features.csv").unwrap();
//! let config = TrialConfig::new(42, 1000, (0.5, 0.1));
//! let report = run_trial(&db, "dt", &config).unwrap();
//! print!("{}", report.table());
//! ```

pub mod analyzers;
pub mod config;
pub mod database;
pub mod entropy;
pub mod error;
pub mod file_io;
pub mod learn;
pub mod metrics;
pub mod sampling;
pub mod scanner;
pub mod trial;
pub mod types;

// Re-export commonly used types at crate root
pub use analyzers::{Analyzer, ImportAnalyzer, PeAnalyzer};
pub use config::{ScanConfig, TrialConfig};
pub use database::Database;
pub use error::{Result, TridentError};
pub use sampling::{gen_seeds, gen_splits, train_test_split, Split};
pub use scanner::{BatchSummary, FileOutcome, InputSource, Scanner, ScannerBuilder};
pub use trial::{run_trial, TrialReport};
pub use types::{FeatureRecord, Label, Schema};
