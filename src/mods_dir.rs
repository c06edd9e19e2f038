//! Pre-sync handling of the previous mods folder
//!
//! Mods are replaced wholesale on every sync. Before extraction the old
//! `mods/` folder is either renamed aside (so the user keeps a copy) or
//! deleted, per the configured policy.

use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, PartialEq)]
pub enum ModsPolicy {
    /// Rename `mods` to the first free `mods-N` before extraction.
    RenameAside,
    /// Remove `mods` and everything under it.
    Delete,
}

/// Apply the policy to `<root>/mods`. Missing folder is a no-op.
/// Must complete before extraction starts.
pub fn prepare_mods_dir(root: &Path, policy: ModsPolicy) -> Result<(), Box<dyn Error>> {
    let mods = root.join("mods");
    if !mods.exists() {
        return Ok(());
    }

    match policy {
        ModsPolicy::RenameAside => {
            let mut index = 1u32;
            loop {
                let candidate = root.join(format!("mods-{index}"));
                if !candidate.exists() {
                    fs::rename(&mods, &candidate).map_err(|e| {
                        format!("could not rename mods folder to '{}': {e}", candidate.display())
                    })?;
                    return Ok(());
                }
                index += 1;
            }
        }
        ModsPolicy::Delete => {
            fs::remove_dir_all(&mods)
                .map_err(|e| format!("could not delete mods folder: {e}"))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("modlink-mods-{}", fastrand::u64(..)));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_mods_is_a_noop() {
        let root = temp_root();
        prepare_mods_dir(&root, ModsPolicy::RenameAside).unwrap();
        prepare_mods_dir(&root, ModsPolicy::Delete).unwrap();
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_rename_picks_first_free_suffix() {
        let root = temp_root();
        fs::create_dir_all(root.join("mods")).unwrap();
        fs::write(root.join("mods/current.jar"), "v3").unwrap();
        fs::create_dir_all(root.join("mods-1")).unwrap();
        fs::write(root.join("mods-1/old.jar"), "v1").unwrap();
        fs::create_dir_all(root.join("mods-2")).unwrap();

        prepare_mods_dir(&root, ModsPolicy::RenameAside).unwrap();

        assert!(!root.join("mods").exists());
        assert_eq!(
            fs::read_to_string(root.join("mods-3/current.jar")).unwrap(),
            "v3"
        );
        // Earlier backups untouched
        assert_eq!(fs::read_to_string(root.join("mods-1/old.jar")).unwrap(), "v1");

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_delete_removes_tree() {
        let root = temp_root();
        fs::create_dir_all(root.join("mods/sub")).unwrap();
        fs::write(root.join("mods/sub/a.jar"), "a").unwrap();

        prepare_mods_dir(&root, ModsPolicy::Delete).unwrap();
        assert!(!root.join("mods").exists());

        fs::remove_dir_all(&root).ok();
    }
}
