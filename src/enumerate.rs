//! Parallel recursive directory enumeration, grounded on
//! `original_source/src/ls_dir_rec.cc`. Recursion is expressed as new
//! tasks posted onto the same `rayon` scope the caller is running on —
//! never stack recursion, so arbitrarily deep trees can't blow the stack.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::Scope;

use crate::config::{is_excluded, Config};
use crate::error::Error;
use crate::logging::log_warn;

/// A `(path, size)` pair for one non-empty regular file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Walks every root in `config.search_roots`, respecting
/// `config.exclude_patterns` and `config.include_empty`, and returns the
/// full inventory. Symlinks are never followed; unreadable entries are
/// logged and skipped, never fatal.
pub fn enumerate(config: &Config) -> Vec<FileEntry> {
    let inventory: Mutex<Vec<FileEntry>> = Mutex::new(Vec::new());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_thread as usize)
        .build();

    let pool = match pool {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };

    pool.scope(|scope| {
        for root in &config.search_roots {
            if is_excluded(root, &config.exclude_patterns) {
                log_warn!("exclude: {}", root.display());
                continue;
            }
            let root = root.clone();
            scope.spawn(|scope| walk_dir(root, scope, &inventory, config));
        }
    });

    inventory.into_inner().unwrap_or_default()
}

fn walk_dir<'scope>(
    dir: PathBuf,
    scope: &Scope<'scope>,
    inventory: &'scope Mutex<Vec<FileEntry>>,
    config: &'scope Config,
) {
    let mut local: Vec<FileEntry> = Vec::new();

    let entries = match fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) => {
            let err = Error::Enumeration {
                path: dir.clone(),
                source: e,
            };
            log_warn!("{err}");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let err = Error::Enumeration {
                    path: dir.clone(),
                    source: e,
                };
                log_warn!("{err}");
                continue;
            }
        };
        let path = entry.path();

        if is_excluded(&path, &config.exclude_patterns) {
            log_warn!("exclude: {}", path.display());
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                let err = Error::FileMeta {
                    path: path.clone(),
                    source: e,
                };
                log_warn!("{err}");
                continue;
            }
        };

        if file_type.is_symlink() {
            log_warn!("skip symlink: {}", path.display());
        } else if file_type.is_dir() {
            scope.spawn(move |scope| walk_dir(path, scope, inventory, config));
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => {
                    let size = meta.len();
                    if size > 0 || config.include_empty {
                        local.push(FileEntry { path, size });
                    }
                }
                Err(e) => {
                    let err = Error::FileMeta {
                        path: path.clone(),
                        source: e,
                    };
                    log_warn!("{err}");
                }
            }
        } else {
            log_warn!("skip unsupported file type: {}", path.display());
        }
    }

    if !local.is_empty() {
        let mut guard = inventory.lock().unwrap_or_else(|p| p.into_inner());
        guard.extend(local);
    }
}
