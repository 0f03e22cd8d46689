//! Filesystem mutations of a run.
//!
//! Everything that creates, renames or deletes a file in the installation goes
//! through this module, and every mutation is followed by a ledger update that
//! is persisted before the next mutation starts.

use crate::error::{Error, Result};
use crate::provenance::{ProvenanceLog, BACKUP_SUFFIX};
use crate::routing::compressed_sibling;
use crate::utils::{backup_path, fingerprint, fingerprint_file};
use camino::{Utf8Path, Utf8PathBuf};

/// Result of writing one output file.
#[derive(Debug, Clone)]
pub struct SlotWrite {
    pub path: Utf8PathBuf,
    /// User files moved to a backup name to make room.
    pub renamed: Vec<Utf8PathBuf>,
    pub bytes_written: usize,
}

/// What happened to a prior output during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorOutput {
    /// Still held the tool's content and was deleted.
    Removed,
    /// Edited since it was written; left in place and no longer tracked.
    UserModified,
    /// Already gone.
    Missing,
}

/// What happened to a tracked backup during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    /// Moved back to its original name.
    Restored,
    /// The backup file no longer exists; the entry was dropped.
    Missing,
    /// The original name is occupied by something else; kept as is.
    Blocked,
}

/// Whether the file at `path` is the tool's own output: the ledger holds a
/// fingerprint for it and the content still matches. A tracked backup for the
/// slot says nothing about what occupies it now.
pub fn is_own_output(path: &Utf8Path, log: &ProvenanceLog) -> bool {
    match (log.fingerprint(path), fingerprint_file(path)) {
        (Some(recorded), Some(actual)) => recorded == actual,
        _ => false,
    }
}

/// Make `target` writable without losing anything the user put there.
///
/// Checks `target` and its compressed sibling (which the game would read in
/// preference to the plain name). Foreign files in either slot are renamed to
/// a free backup name (see [`free_backup_path`]); the tool's own prior output
/// is overwritten (target) or removed (sibling). Returns the paths that were
/// moved aside.
pub fn clear_slot(target: &Utf8Path, log: &mut ProvenanceLog) -> Result<Vec<Utf8PathBuf>> {
    let mut renamed = Vec::new();

    let sibling = compressed_sibling(target);
    for occupant in std::iter::once(target.to_path_buf()).chain(sibling) {
        if !occupant.as_std_path().is_file() {
            continue;
        }

        if is_own_output(&occupant, log) {
            if occupant.as_path() != target {
                tracing::debug!("Removing own prior output {} shadowing {}", occupant, target);
                std::fs::remove_file(occupant.as_std_path()).map_err(|e| Error::WriteConflict {
                    path: occupant.clone(),
                    reason: e.to_string(),
                })?;
                log.forget_written(&occupant)?;
            }
            continue;
        }

        move_aside(&occupant, log)?;
        renamed.push(occupant);
    }

    Ok(renamed)
}

fn move_aside(occupant: &Utf8Path, log: &mut ProvenanceLog) -> Result<Utf8PathBuf> {
    let backup = free_backup_path(occupant);

    if let Some(previous) = log.backup_for(occupant) {
        if previous.as_std_path().is_file() {
            tracing::warn!(
                "{} was replaced after an earlier run moved it aside; the earlier original stays at {}",
                occupant,
                previous
            );
        }
    }

    std::fs::rename(occupant.as_std_path(), backup.as_std_path()).map_err(|e| {
        Error::WriteConflict {
            path: occupant.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    log.record_renamed(occupant, &backup)?;

    tracing::info!("Moved existing {} to {}", occupant, backup);
    Ok(backup)
}

/// First backup name for `path` that nothing occupies: `<name>.x3c.bak`, then
/// `<name>.x3c.bak.2`, `<name>.x3c.bak.3`, ...
pub fn free_backup_path(path: &Utf8Path) -> Utf8PathBuf {
    let first = backup_path(path, BACKUP_SUFFIX);
    if !first.as_std_path().exists() {
        return first;
    }
    (2u32..)
        .map(|n| backup_path(path, &format!("{}.{}", BACKUP_SUFFIX, n)))
        .find(|candidate| !candidate.as_std_path().exists())
        .unwrap_or(first)
}

/// Write `bytes` to `target` under the conflict-safe rename contract and
/// record the write.
pub fn write_output(target: &Utf8Path, bytes: &[u8], log: &mut ProvenanceLog) -> Result<SlotWrite> {
    let renamed = clear_slot(target, log)?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent.as_std_path())?;
    }
    std::fs::write(target.as_std_path(), bytes)?;
    log.record_written(target, fingerprint(bytes))?;

    tracing::debug!("Wrote {} ({} bytes)", target, bytes.len());
    Ok(SlotWrite {
        path: target.to_path_buf(),
        renamed,
        bytes_written: bytes.len(),
    })
}

/// Delete a prior output if it still holds what the tool wrote.
pub fn remove_prior_output(path: &Utf8Path, log: &mut ProvenanceLog) -> Result<PriorOutput> {
    let Some(actual) = fingerprint_file(path) else {
        log.forget_written(path)?;
        return Ok(PriorOutput::Missing);
    };

    if log.fingerprint(path) != Some(actual.as_str()) {
        tracing::warn!(
            "{} was changed after it was written; leaving it in place",
            path
        );
        log.forget_written(path)?;
        return Ok(PriorOutput::UserModified);
    }

    std::fs::remove_file(path.as_std_path())?;
    log.forget_written(path)?;
    tracing::debug!("Removed prior output {}", path);
    Ok(PriorOutput::Removed)
}

/// Move a tracked backup back to its original name if that name is free.
pub fn restore_backup(original: &Utf8Path, backup: &Utf8Path, log: &mut ProvenanceLog) -> Result<BackupState> {
    if !backup.as_std_path().is_file() {
        log.forget_renamed(original)?;
        return Ok(BackupState::Missing);
    }
    if original.as_std_path().exists() {
        return Ok(BackupState::Blocked);
    }

    std::fs::rename(backup.as_std_path(), original.as_std_path())?;
    log.forget_renamed(original)?;
    tracing::info!("Restored {} from {}", original, backup);
    Ok(BackupState::Restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Utf8PathBuf, ProvenanceLog) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let log = ProvenanceLog::open(root.join("log.json"), &root, "test");
        (dir, root, log)
    }

    #[test]
    fn test_write_to_free_slot() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");

        let write = write_output(&target, b"data", &mut log).unwrap();
        assert!(write.renamed.is_empty());
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
        assert_eq!(log.fingerprint(&target), Some(fingerprint(b"data").as_str()));
    }

    #[test]
    fn test_foreign_file_moved_aside() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"user content").unwrap();

        let write = write_output(&target, b"tool content", &mut log).unwrap();
        let backup = root.join("addon/types/TShips.txt.x3c.bak");
        assert_eq!(write.renamed, vec![target.clone()]);
        assert_eq!(std::fs::read(&backup).unwrap(), b"user content");
        assert_eq!(std::fs::read(&target).unwrap(), b"tool content");
        assert_eq!(log.backup_for(&target), Some(backup));
    }

    #[test]
    fn test_compressed_sibling_moved_aside() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");
        let sibling = root.join("addon/types/TShips.pck");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&sibling, b"packed user content").unwrap();

        let write = write_output(&target, b"tool content", &mut log).unwrap();
        assert_eq!(write.renamed, vec![sibling.clone()]);
        assert!(!sibling.exists());
        assert_eq!(
            std::fs::read(root.join("addon/types/TShips.pck.x3c.bak")).unwrap(),
            b"packed user content"
        );
    }

    #[test]
    fn test_own_output_overwritten_in_place() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");
        write_output(&target, b"first", &mut log).unwrap();

        let write = write_output(&target, b"second", &mut log).unwrap();
        assert!(write.renamed.is_empty());
        assert!(!root.join("addon/types/TShips.txt.x3c.bak").exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
    }

    #[test]
    fn test_existing_backup_name_kept() {
        let (_dir, root, mut log) = setup();
        let target = root.join("L/x3story.obj");
        let backup = root.join("L/x3story.obj.x3c.bak");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"current").unwrap();
        std::fs::write(&backup, b"older").unwrap();

        let write = write_output(&target, b"tool", &mut log).unwrap();
        let second = root.join("L/x3story.obj.x3c.bak.2");
        assert_eq!(write.renamed, vec![target.clone()]);
        assert_eq!(std::fs::read(&backup).unwrap(), b"older");
        assert_eq!(std::fs::read(&second).unwrap(), b"current");
        assert_eq!(log.backup_for(&target), Some(second));
    }

    #[test]
    fn test_replaced_output_with_tracked_backup_moved_aside() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"user v1").unwrap();
        write_output(&target, b"tool", &mut log).unwrap();

        std::fs::write(&target, b"user v2").unwrap();
        let write = write_output(&target, b"tool again", &mut log).unwrap();

        assert_eq!(write.renamed, vec![target.clone()]);
        assert_eq!(
            std::fs::read(root.join("addon/types/TShips.txt.x3c.bak")).unwrap(),
            b"user v1"
        );
        let latest = log.backup_for(&target).unwrap();
        assert_eq!(std::fs::read(&latest).unwrap(), b"user v2");
        assert_eq!(std::fs::read(&target).unwrap(), b"tool again");
    }

    #[test]
    fn test_new_sibling_with_tracked_backup_moved_aside() {
        let (_dir, root, mut log) = setup();
        let target = root.join("addon/types/TShips.txt");
        let sibling = root.join("addon/types/TShips.pck");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&sibling, b"packed v1").unwrap();
        write_output(&target, b"tool", &mut log).unwrap();

        std::fs::write(&sibling, b"packed v2").unwrap();
        let write = write_output(&target, b"tool", &mut log).unwrap();

        assert_eq!(write.renamed, vec![sibling.clone()]);
        assert!(!sibling.exists());
        assert_eq!(
            std::fs::read(root.join("addon/types/TShips.pck.x3c.bak")).unwrap(),
            b"packed v1"
        );
        assert_eq!(
            std::fs::read(root.join("addon/types/TShips.pck.x3c.bak.2")).unwrap(),
            b"packed v2"
        );
    }

    #[test]
    fn test_remove_prior_output() {
        let (_dir, root, mut log) = setup();
        let kept = root.join("a.txt");
        let edited = root.join("b.txt");
        write_output(&kept, b"a", &mut log).unwrap();
        write_output(&edited, b"b", &mut log).unwrap();
        std::fs::write(&edited, b"b edited by user").unwrap();

        assert_eq!(remove_prior_output(&kept, &mut log).unwrap(), PriorOutput::Removed);
        assert!(!kept.exists());
        assert_eq!(remove_prior_output(&edited, &mut log).unwrap(), PriorOutput::UserModified);
        assert!(edited.exists());
        assert!(log.fingerprint(&edited).is_none());
        assert_eq!(remove_prior_output(&kept, &mut log).unwrap(), PriorOutput::Missing);
    }

    #[test]
    fn test_restore_backup() {
        let (_dir, root, mut log) = setup();
        let target = root.join("a.txt");
        std::fs::write(&target, b"user").unwrap();
        write_output(&target, b"tool", &mut log).unwrap();
        let backup = log.backup_for(&target).unwrap();

        assert_eq!(restore_backup(&target, &backup, &mut log).unwrap(), BackupState::Blocked);

        remove_prior_output(&target, &mut log).unwrap();
        assert_eq!(restore_backup(&target, &backup, &mut log).unwrap(), BackupState::Restored);
        assert_eq!(std::fs::read(&target).unwrap(), b"user");
        assert!(log.backup_for(&target).is_none());
    }
}
