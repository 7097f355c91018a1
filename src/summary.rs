//! Aggregate statistics over a finished run, in the spirit of the
//! teacher crate's own `summarize` — useful when a caller wants counts
//! instead of a wall of paths.

use size::Size;

use crate::same_size::DuplicateGroup;

pub struct Summary {
    pub group_count: usize,
    pub duplicate_count: usize,
    pub wasted_bytes: u64,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = Size::from_bytes(self.wasted_bytes);
        write!(
            f,
            "{} duplicate files (in {} sets), occupying {size}",
            self.duplicate_count, self.group_count
        )
    }
}

/// Summarizes the groups returned by [`crate::dedupe`]. The canonical
/// member of each group is kept; every other member counts toward
/// `duplicate_count` and `wasted_bytes`.
pub fn summarize(groups: &[DuplicateGroup]) -> Summary {
    let group_count = groups.len();
    let mut duplicate_count = 0;
    let mut wasted_bytes = 0u64;

    for group in groups {
        duplicate_count += group.duplicates().len();
        if let Ok(meta) = std::fs::metadata(group.canonical()) {
            wasted_bytes += meta.len() * group.duplicates().len() as u64;
        }
    }

    Summary {
        group_count,
        duplicate_count,
        wasted_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn summarizes_wasted_bytes() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        File::create(&a).unwrap().write_all(b"hello").unwrap();
        File::create(&b).unwrap().write_all(b"hello").unwrap();

        let groups = vec![DuplicateGroup(vec![a, b])];
        let summary = summarize(&groups);
        assert_eq!(summary.group_count, 1);
        assert_eq!(summary.duplicate_count, 1);
        assert_eq!(summary.wasted_bytes, 5);
    }
}
