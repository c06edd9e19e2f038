//! World reconciliation
//!
//! Worlds that already exist locally are never touched by a sync; worlds only
//! present in the archive are copied in full. This module computes that split
//! and produces the log lines describing it.

use std::collections::BTreeSet;
use std::path::Path;

pub struct WorldPlan {
    /// Archive worlds that already exist locally (skipped by extraction).
    pub existing: BTreeSet<String>,
    /// Archive worlds absent locally (extracted in full).
    pub to_extract: BTreeSet<String>,
}

/// Split the archive's world set against the local `saves/` directory.
pub fn reconcile(archive_worlds: &BTreeSet<String>, saves_dir: &Path) -> WorldPlan {
    let mut existing = BTreeSet::new();
    for world in archive_worlds {
        if saves_dir.join(world).exists() {
            existing.insert(world.clone());
        }
    }
    let to_extract = archive_worlds.difference(&existing).cloned().collect();
    WorldPlan {
        existing,
        to_extract,
    }
}

/// Comma-joined world list, or "none" when empty.
pub fn format_world_list(worlds: &BTreeSet<String>) -> String {
    let names: Vec<&str> = worlds
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// One log line per action, omitted entirely when the set is empty.
/// Singular phrasing for a single world, comma-joined plural otherwise.
pub fn format_world_action(
    worlds: &BTreeSet<String>,
    action_singular: &str,
    action_plural: &str,
) -> Option<String> {
    let names: Vec<&str> = worlds
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    match names.len() {
        0 => None,
        1 => Some(format!("World {} {}", names[0], action_singular)),
        _ => Some(format!("Worlds {} {}", names.join(", "), action_plural)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn worlds(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_reconcile_splits_existing_from_new() {
        let dir = std::env::temp_dir().join(format!("modlink-worlds-{}", fastrand::u64(..)));
        fs::create_dir_all(dir.join("Skyblock")).unwrap();

        let plan = reconcile(&worlds(&["Skyblock", "Farm"]), &dir);
        assert_eq!(plan.existing, worlds(&["Skyblock"]));
        assert_eq!(plan.to_extract, worlds(&["Farm"]));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reconcile_with_no_saves_dir() {
        let dir = std::env::temp_dir().join(format!("modlink-worlds-{}", fastrand::u64(..)));
        // saves/ doesn't exist at all: everything is new
        let plan = reconcile(&worlds(&["Farm"]), &dir);
        assert!(plan.existing.is_empty());
        assert_eq!(plan.to_extract, worlds(&["Farm"]));
    }

    #[test]
    fn test_action_line_singular() {
        let line = format_world_action(&worlds(&["Farm"]), "was skipped", "were skipped");
        assert_eq!(line.unwrap(), "World Farm was skipped");
    }

    #[test]
    fn test_action_line_plural_is_sorted_and_joined() {
        let line = format_world_action(&worlds(&["Farm", "Base"]), "was added", "were added");
        assert_eq!(line.unwrap(), "Worlds Base, Farm were added");
    }

    #[test]
    fn test_action_line_omitted_when_empty() {
        assert!(format_world_action(&worlds(&[]), "was skipped", "were skipped").is_none());
    }

    #[test]
    fn test_world_list_falls_back_to_none() {
        assert_eq!(format_world_list(&worlds(&[])), "none");
        assert_eq!(format_world_list(&worlds(&["A", "B"])), "A, B");
    }
}
