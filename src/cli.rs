use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trident")]
#[command(about = "PE header feature extraction and reproducible train/test splits for malware classification")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract PE header features from a directory or a file list into a CSV database
    Scan {
        /// Directory to walk, or a file listing one sample path per line
        #[arg(short = 'd', long = "dir")]
        input: PathBuf,

        /// Output CSV database
        #[arg(short, long)]
        output: PathBuf,

        /// Type of the samples: malware or clean
        #[arg(short = 't', long = "type")]
        file_type: String,

        /// Append to an existing database instead of creating a new one
        #[arg(short, long)]
        append: bool,

        /// Worker threads (0 = one per core)
        #[arg(long, default_value_t = 0)]
        jobs: usize,

        /// Skip samples byte-identical to one already scanned
        #[arg(long)]
        dedupe: bool,

        /// Follow symbolic links while walking directories
        #[arg(long)]
        follow_symlinks: bool,

        /// Include hidden files and directories
        #[arg(long)]
        hidden: bool,
    },

    /// Print import-symbol presence features as CSV
    Imports {
        /// File listing one PE path per line
        file_list: PathBuf,

        /// File listing one import symbol per line
        imports_list: PathBuf,

        /// Label of the listed files: malicious or benign
        label: String,

        /// Do not print the header line
        #[arg(long)]
        no_header: bool,
    },

    /// Add the columns of a second database describing the same records
    Merge {
        database: PathBuf,

        /// Database with the new columns, same records in the same order
        newdata: PathBuf,

        outfile: PathBuf,
    },

    /// Write seeded stratified train/test splits of a database
    Split {
        database: PathBuf,

        /// Directory receiving tr{i}.csv and te{i}.csv
        outdir: PathBuf,

        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Number of splits
        #[arg(short, long, default_value_t = 3)]
        count: usize,

        /// Training and test sizes
        #[arg(long, num_args = 2, value_names = ["TRAIN", "TEST"], required = true)]
        sizes: Vec<usize>,

        /// Malicious fractions of the training and test sets
        #[arg(long, num_args = 2, value_names = ["TRAIN", "TEST"], required = true)]
        prevalence: Vec<f64>,
    },

    /// Write one database per feature with Name, the feature and isMalware
    Isolate {
        database: PathBuf,
        outdir: PathBuf,
    },

    /// Print the record names of a database
    Names { database: PathBuf },

    /// Evaluate a classifier over repeated seeded splits
    Trial {
        database: PathBuf,

        /// Algorithm: nb, dt or lr
        algorithm: String,

        #[arg(short, long)]
        seed: u64,

        /// Records per split (training plus test)
        #[arg(short = 'n', long)]
        numsamples: usize,

        /// Malicious fractions of the training and test sets; records are drawn
        /// regardless of class when omitted
        #[arg(short = 'm', long, num_args = 2, value_names = ["TRAIN", "TEST"])]
        malfrac: Option<Vec<f64>>,

        /// Beta of the F-beta score
        #[arg(short, long, default_value_t = 1.0)]
        beta: f64,

        #[arg(long, default_value_t = trident::config::DEFAULT_SPLITS)]
        splits: usize,

        /// Save the loaded database here before running
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
