//! Given a slice of equal-size file entries, produce the set of duplicate
//! groups by sorting through [`FileComparator`] and emitting runs of equal
//! elements of length >= 2. Grounded on
//! `original_source/src/dedupe_same_sz.cc`.

use std::path::PathBuf;

use crate::comparator::FileComparator;
use crate::config::Config;
use crate::fingerprint::{self, FingerprintEngine};

/// An ordered group of >= 2 paths, all pairwise equal under the
/// comparator's total order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup(pub Vec<PathBuf>);

impl DuplicateGroup {
    /// The canonical path for this group: the lexicographically first
    /// path once the group is sorted. See spec.md §9's open question on
    /// canonical-path policy, decided in SPEC_FULL.md §4.6.
    pub fn canonical(&self) -> &PathBuf {
        &self.0[0]
    }

    /// Every non-canonical member, i.e. the paths an `Action` acts on.
    pub fn duplicates(&self) -> &[PathBuf] {
        &self.0[1..]
    }

    fn sorted(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        DuplicateGroup(paths)
    }
}

/// One size run's worth of (path, size) pairs, all sharing one size.
pub struct SizeRun {
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

/// Runs the sort-then-scan algorithm for one size run, returning every
/// duplicate group it finds. `run.paths.len()` must be >= 2; the caller
/// (the orchestrator) never dispatches singleton runs.
pub fn dedupe_same_size(run: SizeRun, config: &Config) -> Vec<DuplicateGroup> {
    let max_hash = fingerprint::max_hash(run.size, config.hash_block_size);

    let mut comparators: Vec<FileComparator> = run
        .paths
        .into_iter()
        .map(|p| {
            FileComparator::new(
                p,
                run.size,
                max_hash,
                config.hash_block_size,
                config.hash_seed,
            )
        })
        .collect();

    let mut buf = match fingerprint::new_read_buffer(config.read_buffer_size) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    // One hasher for the whole sort: reset between regions, never rebuilt.
    let mut hasher = FingerprintEngine::new(config.hash_seed);

    comparators.sort_by(|a, b| a.compare(b, &mut buf, &mut hasher));

    let mut groups = Vec::new();
    let mut run_start = 0;
    for i in 1..=comparators.len() {
        let boundary = i == comparators.len()
            || comparators[i].compare(&comparators[run_start], &mut buf, &mut hasher)
                != std::cmp::Ordering::Equal;
        if boundary {
            if i - run_start > 1 {
                let paths: Vec<PathBuf> = comparators[run_start..i]
                    .iter()
                    .map(|c| c.path().to_path_buf())
                    .collect();
                groups.push(DuplicateGroup::sorted(paths));
            }
            run_start = i;
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[test]
    fn groups_equal_files_and_drops_singletons() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a", b"hello");
        let b = write(dir.path(), "b", b"hello");
        let c = write(dir.path(), "c", b"hellz");
        let config = Config::builder()
            .search_root(dir.path().to_path_buf())
            .build()
            .unwrap();

        let run = SizeRun {
            size: 5,
            paths: vec![a.clone(), b.clone(), c],
        };
        let groups = dedupe_same_size(run, &config);
        assert_eq!(groups.len(), 1);
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(groups[0].0, expected);
    }

    #[test]
    fn no_groups_when_all_distinct() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a", b"11111");
        let b = write(dir.path(), "b", b"22222");
        let config = Config::builder()
            .search_root(dir.path().to_path_buf())
            .build()
            .unwrap();
        let run = SizeRun {
            size: 5,
            paths: vec![a, b],
        };
        assert!(dedupe_same_size(run, &config).is_empty());
    }
}
