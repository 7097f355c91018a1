//! The total order over files described in spec.md §4.2: two files
//! compare equal iff their fingerprint sequences are element-wise equal
//! (modulo the hard-link fast path). Grounded on
//! `original_source/include/file_cmp.hh` and `src/file_cmp.cc`, carried
//! into Rust as interior mutability instead of C++'s `mutable` members —
//! comparators only ever live inside one worker thread during a sort, so
//! `RefCell` (not a `Mutex`) is the right tool.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::fingerprint::{self, Digest, FingerprintEngine};
use crate::logging::log_err;

/// One file entry plus its lazily-materialized fingerprint blocks.
///
/// `remaining + bytes_read == size` always holds; cached blocks are a
/// prefix of the file's full fingerprint sequence.
pub struct FileComparator {
    path: PathBuf,
    size: u64,
    max_hash: u32,
    block_size: u64,
    hash_seed: u64,
    hard_link_id: Option<(u64, u64)>, // (dev, ino) when nlink > 1
    hard_link_count: u64,
    state: RefCell<State>,
}

struct State {
    cached: Vec<Digest>,
    remaining: u64,
    stream: Option<File>,
    /// Once poisoned, this comparator compares unequal to everything.
    poisoned: bool,
}

impl FileComparator {
    /// `max_hash` is derived once per size-run from the run's common
    /// size and passed in, matching `dedupe_same_sz`'s single computation
    /// shared across every comparator in the run.
    pub fn new(
        path: PathBuf,
        size: u64,
        max_hash: u32,
        block_size: u64,
        hash_seed: u64,
    ) -> Self {
        let (hard_link_id, hard_link_count) = match std::fs::symlink_metadata(&path) {
            Ok(meta) => {
                let nlink = meta.nlink();
                let id = if nlink > 1 {
                    Some((meta.dev(), meta.ino()))
                } else {
                    None
                };
                (id, nlink)
            }
            Err(_) => (None, 1),
        };

        FileComparator {
            path,
            size,
            max_hash,
            block_size,
            hash_seed,
            hard_link_id,
            hard_link_count,
            state: RefCell::new(State {
                cached: Vec::with_capacity(max_hash as usize),
                remaining: size,
                stream: None,
                poisoned: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` without reading either file if both sides are
    /// hard links to the same inode with matching link counts.
    fn hard_link_fast_path(&self, rhs: &FileComparator) -> bool {
        self.hard_link_count > 1
            && self.hard_link_count == rhs.hard_link_count
            && self.hard_link_id.is_some()
            && self.hard_link_id == rhs.hard_link_id
    }

    /// Ensures block `idx` is materialized, reading and hashing the
    /// region if it isn't cached yet. On short read or I/O error, poisons
    /// the comparator: its cache is padded to `max_hash` with a sentinel
    /// so it compares unequal to every peer from then on.
    ///
    /// `hasher` is the caller's per-worker, per-sort scratch hasher (see
    /// `same_size::dedupe_same_size`); it is reset here rather than
    /// rebuilt, per spec.md §9's "reuse one buffer and one hasher per
    /// worker" requirement.
    fn lazy_hash(&self, idx: u32, buf: &mut [u8], hasher: &mut FingerprintEngine) {
        let mut state = self.state.borrow_mut();
        if state.poisoned || (idx as usize) < state.cached.len() {
            return;
        }

        if state.stream.is_none() {
            match File::open(&self.path) {
                Ok(mut f) => {
                    let processed = self.size - state.remaining;
                    if let Err(e) = f.seek(SeekFrom::Start(processed)) {
                        let err = Error::FileOpen {
                            path: self.path.clone(),
                            source: e,
                        };
                        log_err!("{err}");
                        Self::poison(&mut state, self.max_hash);
                        return;
                    }
                    state.stream = Some(f);
                }
                Err(e) => {
                    let err = Error::FileOpen {
                        path: self.path.clone(),
                        source: e,
                    };
                    log_err!("{err}");
                    Self::poison(&mut state, self.max_hash);
                    return;
                }
            }
        }

        let region_len = fingerprint::region_len(idx, self.block_size, state.remaining);
        hasher.reset();

        let mut left = region_len;
        let mut failure: Option<Error> = None;
        while left > 0 {
            let want = (left as usize).min(buf.len());
            match Self::read_exact_or_eof(state.stream.as_mut().unwrap(), &mut buf[..want]) {
                Ok(got) if got == want => {
                    hasher.update(&buf[..want]);
                    left -= want as u64;
                }
                Ok(got) => {
                    failure = Some(Error::ShortRead {
                        path: self.path.clone(),
                        expected: want,
                        got,
                    });
                    break;
                }
                Err(e) => {
                    failure = Some(Error::FileOpen {
                        path: self.path.clone(),
                        source: e,
                    });
                    break;
                }
            }
        }

        if let Some(err) = failure {
            log_err!("{err}");
            Self::poison(&mut state, self.max_hash);
            return;
        }

        state.remaining -= region_len;
        state.cached.push(hasher.digest());
    }

    fn read_exact_or_eof(f: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match f.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn poison(state: &mut State, max_hash: u32) {
        state.cached.resize(max_hash as usize, 0);
        state.remaining = 0;
        state.poisoned = true;
    }

    fn close(&self) {
        self.state.borrow_mut().stream.take();
    }

    /// Compares two comparators, materializing blocks on demand and
    /// short-circuiting on the first differing block. Closes both sides'
    /// file handles before returning, regardless of outcome.
    ///
    /// `buf` and `hasher` are scratch owned by the calling worker and
    /// reused across every comparison in its sort (see
    /// `same_size::dedupe_same_size`).
    pub fn compare(&self, rhs: &FileComparator, buf: &mut [u8], hasher: &mut FingerprintEngine) -> Ordering {
        if self.hard_link_fast_path(rhs) {
            return Ordering::Equal;
        }

        let mut result = Ordering::Equal;
        for i in 0..self.max_hash {
            self.lazy_hash(i, buf, hasher);
            rhs.lazy_hash(i, buf, hasher);

            let lhs_state = self.state.borrow();
            let rhs_state = rhs.state.borrow();

            // A poisoned comparator never compares equal to anything; a
            // stable (if somewhat arbitrary) tiebreak keeps the sort total.
            if lhs_state.poisoned || rhs_state.poisoned {
                result = match (lhs_state.poisoned, rhs_state.poisoned) {
                    (true, true) => (self.path.as_os_str()).cmp(rhs.path.as_os_str()),
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    _ => unreachable!(),
                };
                break;
            }

            let a = lhs_state.cached[i as usize];
            let b = rhs_state.cached[i as usize];
            result = a.cmp(&b);
            if result != Ordering::Equal {
                break;
            }
        }

        self.close();
        rhs.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HASH_SEED;
    use std::io::Write;
    use tempfile::tempdir;

    fn make(dir: &Path, name: &str, content: &[u8]) -> (PathBuf, u64) {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        (path, content.len() as u64)
    }

    fn cmp_pair(a: &FileComparator, b: &FileComparator) -> Ordering {
        let mut buf = vec![0u8; 4096];
        let mut hasher = FingerprintEngine::new(DEFAULT_HASH_SEED);
        a.compare(b, &mut buf, &mut hasher)
    }

    #[test]
    fn identical_content_compares_equal() {
        let dir = tempdir().unwrap();
        let (pa, size) = make(dir.path(), "a", b"hello");
        let (pb, _) = make(dir.path(), "b", b"hello");
        let max_hash = fingerprint::max_hash(size, 512);
        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb, size, max_hash, 512, DEFAULT_HASH_SEED);
        assert_eq!(cmp_pair(&ca, &cb), Ordering::Equal);
    }

    #[test]
    fn different_content_compares_unequal() {
        let dir = tempdir().unwrap();
        let (pa, size) = make(dir.path(), "a", b"hello");
        let (pb, _) = make(dir.path(), "b", b"world");
        let max_hash = fingerprint::max_hash(size, 512);
        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb, size, max_hash, 512, DEFAULT_HASH_SEED);
        assert_ne!(cmp_pair(&ca, &cb), Ordering::Equal);
    }

    #[test]
    fn suffix_difference_detected_without_reading_past_it() {
        // Two 1 MiB files identical in region 0 and 1, differ at byte 600
        // (region 1 covers [512, 1024)). Expect inequality, discovered by
        // region 1 alone.
        let dir = tempdir().unwrap();
        let content_a = vec![7u8; 1024 * 1024];
        let mut content_b = content_a.clone();
        content_b[600] = 9;
        let (pa, size) = make(dir.path(), "a", &content_a);
        let (pb, _) = make(dir.path(), "b", &content_b);
        let max_hash = fingerprint::max_hash(size, 512);
        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb, size, max_hash, 512, DEFAULT_HASH_SEED);
        assert_ne!(cmp_pair(&ca, &cb), Ordering::Equal);
    }

    #[test]
    fn hard_links_compare_equal_without_reading() {
        let dir = tempdir().unwrap();
        let (pa, size) = make(dir.path(), "a", b"x");
        let pb = dir.path().join("b");
        std::fs::hard_link(&pa, &pb).unwrap();
        let max_hash = fingerprint::max_hash(size, 512);
        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb, size, max_hash, 512, DEFAULT_HASH_SEED);
        assert!(ca.hard_link_fast_path(&cb));
        assert_eq!(cmp_pair(&ca, &cb), Ordering::Equal);
    }

    #[test]
    fn poisoned_comparator_never_equal() {
        let dir = tempdir().unwrap();
        let (pa, size) = make(dir.path(), "a", b"hello");
        let (pb, _) = make(dir.path(), "b", b"hello");
        let max_hash = fingerprint::max_hash(size, 512);
        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb.clone(), size, max_hash, 512, DEFAULT_HASH_SEED);
        // Simulate a read failure by removing the file before comparison.
        std::fs::remove_file(&pb).unwrap();
        assert_ne!(cmp_pair(&ca, &cb), Ordering::Equal);
    }

    #[test]
    fn permission_revoked_after_enumeration_poisons_without_crashing() {
        // Mirrors a file that becomes unreadable between enumeration and
        // hashing: comparator construction still succeeds (it only stats
        // the file), but the later open fails and the comparator poisons.
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let (pa, size) = make(dir.path(), "a", b"hello");
        let (pb, _) = make(dir.path(), "b", b"hello");
        let max_hash = fingerprint::max_hash(size, 512);

        std::fs::set_permissions(&pb, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits don't stop root from reading; skip under root
        // rather than assert something the kernel won't enforce.
        let enforced = File::open(&pb).is_err();
        if !enforced {
            std::fs::set_permissions(&pb, std::fs::Permissions::from_mode(0o644)).unwrap();
            return;
        }

        let ca = FileComparator::new(pa, size, max_hash, 512, DEFAULT_HASH_SEED);
        let cb = FileComparator::new(pb.clone(), size, max_hash, 512, DEFAULT_HASH_SEED);
        let result = cmp_pair(&ca, &cb);
        // Restore permissions so tempdir cleanup can remove the file.
        std::fs::set_permissions(&pb, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert_ne!(result, Ordering::Equal);
    }
}
