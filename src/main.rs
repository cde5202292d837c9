mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse args early to get verbose flag for logging initialization
    let args = cli::Args::parse();

    // RUST_LOG wins over the verbose flag, e.g. RUST_LOG=trident::scanner=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("trident=debug")
    } else {
        EnvFilter::new("trident=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    match args.command {
        cli::Command::Scan {
            input,
            output,
            file_type,
            append,
            jobs,
            dedupe,
            follow_symlinks,
            hidden,
        } => commands::scan::run(&commands::scan::ScanOptions {
            input: &input,
            output: &output,
            file_type: &file_type,
            append,
            jobs,
            dedupe,
            follow_symlinks,
            hidden,
        }),
        cli::Command::Imports {
            file_list,
            imports_list,
            label,
            no_header,
        } => commands::imports::run(&file_list, &imports_list, &label, no_header),
        cli::Command::Merge {
            database,
            newdata,
            outfile,
        } => commands::merge::run(&database, &newdata, &outfile),
        cli::Command::Split {
            database,
            outdir,
            seed,
            count,
            sizes,
            prevalence,
        } => commands::split::run(&commands::split::SplitOptions {
            database: &database,
            outdir: &outdir,
            seed,
            count,
            sizes: (sizes[0], sizes[1]),
            prevalence: (prevalence[0], prevalence[1]),
        }),
        cli::Command::Isolate { database, outdir } => commands::isolate::run(&database, &outdir),
        cli::Command::Names { database } => commands::names::run(&database),
        cli::Command::Trial {
            database,
            algorithm,
            seed,
            numsamples,
            malfrac,
            beta,
            splits,
            export,
            json,
        } => commands::trial::run(&commands::trial::TrialOptions {
            database: &database,
            algorithm: &algorithm,
            seed,
            num_samples: numsamples,
            malfrac: malfrac.map(|m| (m[0], m[1])),
            beta,
            splits,
            export: export.as_deref(),
            json,
        }),
    }
}
