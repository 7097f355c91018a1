//! Top-level `dedupe()` entry point: enumerate, sort by size, partition
//! into size runs, dispatch each run >= 2 to the same-size deduper on a
//! shared pool, merge. Grounded on `original_source/src/dedupe.cc`.

use std::time::Instant;

use rayon::prelude::*;

use crate::config::Config;
use crate::enumerate::{enumerate, FileEntry};
use crate::error::{Error, Result};
use crate::logging::log_info;
use crate::same_size::{dedupe_same_size, DuplicateGroup, SizeRun};

/// Runs a full duplicate-detection pass using `config`.
pub fn dedupe_with_config(config: Config) -> Result<Vec<DuplicateGroup>> {
    if config.search_roots.is_empty() {
        return Err(Error::InvalidArgument(
            "at least one search root is required".into(),
        ));
    }
    if config.max_thread == 0 || config.max_thread > 256 {
        return Err(Error::InvalidArgument(
            "max_thread must be > 0 and <= 256".into(),
        ));
    }

    let start = Instant::now();

    log_info!("listing files...");
    let mut inventory: Vec<FileEntry> = enumerate(&config);
    log_info!("elapsed: {:?}", start.elapsed());
    log_info!("file count: {}", inventory.len());

    log_info!("sorting files by size...");
    inventory.sort_by_key(|e| e.size);
    log_info!("elapsed: {:?}", start.elapsed());

    log_info!("detecting duplicates...");
    let runs = partition_by_size(inventory);
    log_info!("job count: {}", runs.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_thread as usize)
        .build()
        .map_err(|e| Error::ResourceExhausted(e.to_string()))?;

    let groups: Vec<DuplicateGroup> = pool.install(|| {
        runs.into_par_iter()
            .flat_map(|run| dedupe_same_size(run, &config))
            .collect()
    });

    log_info!("elapsed: {:?}", start.elapsed());
    log_info!("duplicate group count: {}", groups.len());

    Ok(groups)
}

/// Convenience entry point matching spec.md §6's library surface exactly.
pub fn dedupe(
    search_dirs: Vec<std::path::PathBuf>,
    exclude_regex: Vec<regex::Regex>,
    max_thread: u32,
) -> Result<Vec<DuplicateGroup>> {
    let config = Config::builder()
        .search_roots(search_dirs)
        .exclude_patterns(exclude_regex)
        .max_thread(max_thread)
        .build()?;
    dedupe_with_config(config)
}

/// Single-pass scan producing maximal runs of equal size; singleton runs
/// are discarded here, with no I/O performed on them.
fn partition_by_size(inventory: Vec<FileEntry>) -> Vec<SizeRun> {
    let mut runs = Vec::new();
    let mut iter = inventory.into_iter().peekable();

    while let Some(first) = iter.next() {
        let size = first.size;
        let mut paths = vec![first.path];
        while let Some(next) = iter.peek() {
            if next.size != size {
                break;
            }
            paths.push(iter.next().unwrap().path);
        }
        if paths.len() > 1 {
            runs.push(SizeRun { size, paths });
        }
    }

    runs
}
