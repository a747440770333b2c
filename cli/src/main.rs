mod input;
mod output;

use std::{
    io,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use passaudit_core::{
    build_index, default_thread_count, self_check, worker_pool, AuditCounters, ConsoleSink,
    CrackingEngine, PrehashedDictionary, ProgressReporter, ProgressTicker, ThreadPool,
    DEFAULT_MILESTONE_INTERVAL,
};

/// Audit user credentials against a dictionary of known passwords.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// The users file, one `username,hashedPasswordHex` record per line.
    #[clap(value_parser)]
    users: PathBuf,

    /// The dictionary file, one candidate plaintext per line.
    #[clap(value_parser)]
    dictionary: PathBuf,

    /// The output CSV file for the cracked credentials.
    #[clap(value_parser)]
    output: PathBuf,

    /// The number of worker threads used for both phases.
    #[clap(short = 'j', long, default_value_t = default_thread_count())]
    threads: usize,

    /// The progress milestone interval, in checked users.
    #[clap(long, default_value_t = DEFAULT_MILESTONE_INTERVAL)]
    milestone: u64,

    /// The period of the wall-clock progress reporter in seconds.
    /// 0 disables it, leaving per-unit reporting only.
    #[clap(long, default_value_t = 1)]
    progress_secs: u64,

    /// A prehash cache file to load, or to create when missing or stale.
    #[clap(long, value_parser)]
    cache: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    self_check().context("Unable to start the audit")?;
    let start = Instant::now();

    let users = input::load_users(&cli.users);
    let words = input::load_dictionary(&cli.dictionary);

    let pool = worker_pool(cli.threads).context("Unable to start the audit")?;
    println!("Using a worker pool with {} threads.", cli.threads);

    let counters = Arc::new(AuditCounters::new());
    let dictionary = prehash_dictionary(&cli, &words, &counters, &pool);
    println!(
        "Pre-hashing complete. Total unique dictionary hashes: {}",
        dictionary.len()
    );

    let reporter = Arc::new(ProgressReporter::new(
        users.len() as u64,
        cli.milestone,
        counters.clone(),
        Box::new(ConsoleSink),
    ));
    let ticker = (cli.progress_secs > 0)
        .then(|| ProgressTicker::start(reporter.clone(), Duration::from_secs(cli.progress_secs)));

    let engine = CrackingEngine::new(&users, &dictionary, &counters, &reporter);
    let cracked = pool.install(|| engine.run());

    if let Some(ticker) = ticker {
        ticker.stop();
    }

    let snapshot = counters.snapshot();
    println!("\nAttack complete.");
    println!("Total passwords found: {}", snapshot.passwords_found);
    println!("Total dictionary hashes computed: {}", snapshot.hashes_computed);
    println!(
        "Total time spent (milliseconds): {}",
        start.elapsed().as_millis()
    );

    if !cracked.is_empty() {
        output::write_cracked_csv(&cli.output, &cracked);
    }

    Ok(())
}

/// Returns the prehash index, from the cache when one is configured, present
/// and built from a word list of the same length, otherwise by hashing the
/// dictionary on the worker pool. Cache problems are warnings, never fatal.
fn prehash_dictionary(
    cli: &Cli,
    words: &[String],
    counters: &Arc<AuditCounters>,
    pool: &ThreadPool,
) -> PrehashedDictionary {
    if let Some(cache_path) = &cli.cache {
        match PrehashedDictionary::load(cache_path) {
            Ok(cached) if cached.is_fresh(words.len() as u64) => {
                println!("Loaded the prehash cache from {}.", cache_path.display());
                return cached;
            }
            Ok(_) => {
                warn!(path = %cache_path.display(), "the prehash cache is stale, rebuilding the index");
            }
            Err(err) => {
                warn!(path = %cache_path.display(), %err, "unable to load the prehash cache, rebuilding the index");
            }
        }
    }

    let dictionary = pool.install(|| build_index(words, counters));

    if let Some(cache_path) = &cli.cache {
        if let Err(err) = dictionary.store(cache_path) {
            warn!(path = %cache_path.display(), %err, "unable to save the prehash cache");
        }
    }

    dictionary
}
