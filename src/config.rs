use std::path::PathBuf;

use regex::Regex;

use crate::error::{Error, Result};

/// Base hash-block size in bytes (`B` in spec terms). Region 0 covers
/// `[0, B)`; region `i > 0` covers `[B * 2^(i-1), B * 2^i)`.
pub const DEFAULT_HASH_BLOCK_SIZE: u64 = 512;

/// Default I/O read-buffer size: 16 MiB, a power of two.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Process-wide hash seed, matching the fixed nonzero constant carried by
/// the original C++ program this engine is descended from.
pub const DEFAULT_HASH_SEED: u64 = 0x178e_e47c_0190_226c;

pub const DEFAULT_MAX_THREAD: u32 = 4;

/// Validated configuration for a `dedupe` run: every "recognized option"
/// the engine accepts, bundled with its default and its validity check.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_roots: Vec<PathBuf>,
    pub exclude_patterns: Vec<Regex>,
    pub max_thread: u32,
    pub hash_block_size: u64,
    pub read_buffer_size: usize,
    pub hash_seed: u64,
    /// Also consider empty (zero-byte) files. Off by default, per spec.
    pub include_empty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            search_roots: Vec::new(),
            exclude_patterns: Vec::new(),
            max_thread: DEFAULT_MAX_THREAD,
            hash_block_size: DEFAULT_HASH_BLOCK_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            hash_seed: DEFAULT_HASH_SEED,
            include_empty: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    fn validate(&self) -> Result<()> {
        if self.search_roots.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one search root is required".into(),
            ));
        }
        if self.max_thread == 0 || self.max_thread > 256 {
            return Err(Error::InvalidArgument(
                "max_thread must be > 0 and <= 256".into(),
            ));
        }
        if self.hash_block_size == 0 {
            return Err(Error::InvalidArgument(
                "hash_block_size must be > 0".into(),
            ));
        }
        if self.read_buffer_size < 4096 || !self.read_buffer_size.is_power_of_two() {
            return Err(Error::InvalidArgument(
                "read_buffer_size must be a power of two >= 4096".into(),
            ));
        }
        Ok(())
    }
}

/// Builds a [`Config`], rejecting out-of-range values at `build()` time
/// rather than letting them panic deep inside a worker.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    pub fn search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.inner.search_roots.push(root.into());
        self
    }

    pub fn search_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inner.search_roots.extend(roots);
        self
    }

    pub fn exclude_pattern(mut self, pattern: Regex) -> Self {
        self.inner.exclude_patterns.push(pattern);
        self
    }

    pub fn exclude_patterns(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.inner.exclude_patterns.extend(patterns);
        self
    }

    pub fn max_thread(mut self, max_thread: u32) -> Self {
        self.inner.max_thread = max_thread;
        self
    }

    pub fn hash_block_size(mut self, hash_block_size: u64) -> Self {
        self.inner.hash_block_size = hash_block_size;
        self
    }

    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.inner.read_buffer_size = read_buffer_size;
        self
    }

    pub fn hash_seed(mut self, hash_seed: u64) -> Self {
        self.inner.hash_seed = hash_seed;
        self
    }

    pub fn include_empty(mut self, include_empty: bool) -> Self {
        self.inner.include_empty = include_empty;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Matches `path` (in its native string form) against every exclude
/// pattern; mirrors `original_source/src/dedupe.cc`'s `is_exclude`, which
/// is consulted both at the top-level roots and inside the recursive
/// directory walk.
pub fn is_excluded(path: &std::path::Path, patterns: &[Regex]) -> bool {
    let text = path.to_string_lossy();
    patterns.iter().any(|re| re.is_match(&text))
}
