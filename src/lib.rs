//! Duplicate-file detection engine.
//!
//! Finds groups of duplicate regular files beneath a set of search roots
//! by combining parallel recursive directory enumeration, grouping by
//! exact file size, and a lazily-computed, block-keyed content
//! fingerprint to confirm identity within each size group.
//!
//! ```no_run
//! let groups = dupesweep::dedupe(vec!["/data".into()], vec![], 4)?;
//! for group in &groups {
//!     println!("{:?}", group.0);
//! }
//! # Ok::<(), dupesweep::Error>(())
//! ```

pub mod action;
pub mod comparator;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod fingerprint;
pub(crate) mod logging;
pub mod orchestrator;
pub mod same_size;
pub mod summary;

pub use action::{apply_action, apply_action_to_groups, remove, Action};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use orchestrator::{dedupe, dedupe_with_config};
pub use same_size::DuplicateGroup;

/// Installs the `[log]`/`[warn]`/`[err]` stderr surface. Drivers call this
/// once at startup; library consumers that already run their own
/// `tracing` subscriber can skip it.
pub fn init_logging(verbose: bool) {
    logging::init(verbose);
}
