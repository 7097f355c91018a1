//! The remove/link action executor, grounded on
//! `original_source/src/rm_file.cpp` and `include/rm_t.hpp`. Spec.md left
//! this as an external collaborator with a narrow contract
//! (`remove(rm_list) -> void`); SPEC_FULL.md §4.6 builds out the original
//! program's full action family behind that same contract.

use std::path::{Path, PathBuf};

use crate::logging::{log_err, log_info};
use crate::same_size::DuplicateGroup;

/// What to do with each non-canonical path in a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Log the pair, make no filesystem change.
    Log,
    /// Delete the duplicate outright.
    Remove,
    /// Delete, then recreate as a relative symlink to the canonical path.
    SymlinkRelative,
    /// Delete, then recreate as an absolute symlink to the canonical path.
    SymlinkAbsolute,
    /// Delete, then recreate as a hard link to the canonical path.
    HardLink,
}

/// Applies `action` to every `(duplicate_path, canonical_path)` pair.
/// Never panics or aborts early: every per-path failure is logged and the
/// remaining pairs are still processed.
pub fn apply_action(pairs: &[(PathBuf, PathBuf)], action: Action) {
    for (dup, canonical) in pairs {
        rm_file(dup, canonical, action);
    }
}

/// Applies `action` to every duplicate in every group, using each group's
/// own canonical path (see [`DuplicateGroup::canonical`]).
pub fn apply_action_to_groups(groups: &[DuplicateGroup], action: Action) {
    for group in groups {
        let canonical = group.canonical().clone();
        for dup in group.duplicates() {
            rm_file(dup, &canonical, action);
        }
    }
}

/// Degenerate case matching spec.md §6's `remove(rm_list) -> void`
/// contract exactly: deletes every path in `rm_list`, logging failures,
/// never raising.
pub fn remove(rm_list: &[PathBuf]) {
    for path in rm_list {
        if let Err(e) = std::fs::remove_file(path) {
            log_err!("failed to remove: {} - {e}", path.display());
        }
    }
}

fn rm_file(dup_path: &Path, canonical_path: &Path, action: Action) {
    log_info!("<- {}\n-> {}", dup_path.display(), canonical_path.display());

    if action == Action::Log {
        return;
    }

    if let Err(e) = std::fs::remove_file(dup_path) {
        log_err!("failed to remove: {} - {e}", dup_path.display());
        return;
    }

    let result = match action {
        Action::Log => unreachable!(),
        Action::Remove => Ok(()),
        Action::SymlinkRelative => {
            let parent = dup_path.parent().unwrap_or_else(|| Path::new("."));
            let target = pathdiff_relative(canonical_path, parent);
            symlink(&target, dup_path)
        }
        Action::SymlinkAbsolute => {
            let target = std::fs::canonicalize(canonical_path)
                .unwrap_or_else(|_| canonical_path.to_path_buf());
            symlink(&target, dup_path)
        }
        Action::HardLink => std::fs::hard_link(canonical_path, dup_path),
    };

    if let Err(e) = result {
        log_err!("error recreating: {} - {e}", dup_path.display());
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Computes `target` relative to `base`, falling back to the absolute
/// path if they share no common ancestor (e.g. different drives/mounts).
fn pathdiff_relative(target: &Path, base: &Path) -> PathBuf {
    let target = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
    let base = std::fs::canonicalize(base).unwrap_or_else(|_| base.to_path_buf());

    let mut target_components = target.components();
    let mut base_components = base.components();
    loop {
        let t = target_components.clone().next();
        let b = base_components.clone().next();
        match (t, b) {
            (Some(tc), Some(bc)) if tc == bc => {
                target_components.next();
                base_components.next();
            }
            _ => break,
        }
    }

    let ups = base_components.count();
    let mut result = PathBuf::new();
    for _ in 0..ups {
        result.push("..");
    }
    result.extend(target_components);
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn remove_deletes_listed_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup");
        File::create(&path).unwrap().write_all(b"x").unwrap();
        remove(&[path.clone()]);
        assert!(!path.exists());
    }

    #[test]
    fn remove_logs_and_continues_on_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        // Should not panic.
        remove(&[missing]);
    }

    #[test]
    fn hard_link_action_links_to_canonical() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("a");
        let dup = dir.path().join("b");
        File::create(&canonical).unwrap().write_all(b"x").unwrap();
        File::create(&dup).unwrap().write_all(b"x").unwrap();

        apply_action(&[(dup.clone(), canonical.clone())], Action::HardLink);

        use std::os::unix::fs::MetadataExt;
        let meta_a = fs::metadata(&canonical).unwrap();
        let meta_b = fs::metadata(&dup).unwrap();
        assert_eq!(meta_a.ino(), meta_b.ino());
    }

    #[test]
    fn log_action_makes_no_change() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("a");
        let dup = dir.path().join("b");
        File::create(&canonical).unwrap().write_all(b"x").unwrap();
        File::create(&dup).unwrap().write_all(b"x").unwrap();

        apply_action(&[(dup.clone(), canonical.clone())], Action::Log);
        assert!(dup.exists());
        assert!(canonical.exists());
    }
}
