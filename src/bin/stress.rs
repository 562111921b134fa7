//! skipmem stress binary
//!
//! Runs one writer and several readers against a single memtable, checks the
//! iteration order after the run, and prints the level histogram.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use clap::Parser;
use skipmem::{LevelSeed, MemTable, MemTableConfig, MAX_LEVEL};
use tracing_subscriber::{fmt, EnvFilter};

/// skipmem stress test
#[derive(Parser, Debug)]
#[command(name = "skipmem-stress")]
#[command(about = "Concurrent insert/find/scan stress test for the skip-list memtable")]
#[command(version)]
struct Args {
    /// Number of entries the writer inserts
    #[arg(short, long, default_value = "100000")]
    entries: usize,

    /// Number of concurrent reader threads
    #[arg(short, long, default_value = "4")]
    readers: usize,

    /// Level seed (omit to seed from the OS)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Value size in bytes
    #[arg(short, long, default_value = "16")]
    value_size: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,skipmem=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("skipmem stress v{}", skipmem::VERSION);
    tracing::info!(
        entries = args.entries,
        readers = args.readers,
        seed = ?args.seed,
        "starting run"
    );

    let config = MemTableConfig::builder()
        .level_seed(args.seed.map_or(LevelSeed::Entropy, LevelSeed::Fixed))
        .build();

    let memtable = match MemTable::with_config(0, config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to create memtable: {}", e);
            std::process::exit(1);
        }
    };

    let started = Instant::now();
    if let Err(e) = run(&memtable, &args) {
        tracing::error!("Stress run failed: {}", e);
        std::process::exit(1);
    }
    let elapsed = started.elapsed();

    let mut histogram = [0usize; MAX_LEVEL];
    let mut previous: Option<(Vec<u8>, i64)> = None;
    let mut iter = memtable.iter();
    while iter.advance() {
        let Some(entry) = iter.entry() else { break };
        if let Some((key, timestamp)) = &previous {
            let ordered = key.as_slice() < entry.key
                || (key.as_slice() == entry.key && *timestamp > entry.timestamp);
            if !ordered {
                tracing::error!("Iteration out of order at key {:?}", entry.key);
                std::process::exit(1);
            }
        }
        histogram[entry.height - 1] += 1;
        previous = Some((entry.key.to_vec(), entry.timestamp));
    }
    iter.close();

    tracing::info!(
        elapsed_ms = elapsed.as_millis() as u64,
        entries = memtable.len(),
        size_bytes = memtable.size_bytes(),
        sequence_upper = memtable.sequence_upper(),
        "run complete"
    );

    for (level, count) in histogram.iter().enumerate().filter(|(_, count)| **count > 0) {
        println!("level {:>2}: {}", level, count);
    }
}

/// Writer inserts `args.entries` distinct keys while readers look up keys the
/// writer has already acknowledged and scan the whole table.
fn run(memtable: &MemTable, args: &Args) -> skipmem::Result<()> {
    let published = AtomicUsize::new(0);
    let done = AtomicBool::new(false);
    let value = vec![b'v'; args.value_size];

    let outcome = crossbeam::scope(|s| {
        for reader in 0..args.readers {
            let published = &published;
            let done = &done;
            s.spawn(move |_| {
                let mut lookups = 0usize;
                let mut scans = 0usize;
                while !done.load(Ordering::Acquire) {
                    let upto = published.load(Ordering::Acquire);
                    if upto > 0 {
                        let key = key_for((lookups * 7919 + reader) % upto);
                        match memtable.find(&key) {
                            Ok(Some(_)) => {}
                            Ok(None) => tracing::error!("Acknowledged key {:?} not found", key),
                            Err(e) => tracing::error!("Lookup failed: {}", e),
                        }
                        lookups += 1;
                    }
                    if lookups % 1024 == 0 {
                        let _ = memtable.iter().count();
                        scans += 1;
                    }
                }
                tracing::debug!(reader, lookups, scans, "reader finished");
            });
        }

        let result = (0..args.entries).try_for_each(|i| -> skipmem::Result<()> {
            memtable.insert(i as i64, key_for(i), i as i64, value.clone())?;
            published.store(i + 1, Ordering::Release);
            Ok(())
        });
        done.store(true, Ordering::Release);
        result
    });

    match outcome {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("A reader thread panicked");
            std::process::exit(1);
        }
    }
}

fn key_for(i: usize) -> Vec<u8> {
    // Spread keys out so inserts do not always land at the tail.
    let scrambled = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    format!("key-{:016x}-{}", scrambled, i).into_bytes()
}
