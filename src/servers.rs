//! Server bookmark merge
//!
//! Bundles may ship a plain-text `server.txt` descriptor naming a multiplayer
//! server. The bookmark is merged into the game's `servers.dat` NBT file,
//! keyed by ip: an entry with the same ip already present means nothing is
//! written. The file is edited through `fastnbt::Value` so unrelated fields
//! on existing entries (icons and the like) survive the rewrite untouched.

use fastnbt::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct Bookmark {
    pub name: String,
    pub ip: String,
}

pub enum MergeOutcome {
    Added,
    AlreadyExists,
    /// servers.dat exists but could not be read or parsed; nothing written.
    ReadError(String),
    /// The merged list could not be persisted.
    WriteError(String),
}

/// Parse the `name=...` / `ip=...` descriptor. Values are trimmed and may be
/// wrapped in double quotes. Both keys are required.
pub fn parse_descriptor(text: &str) -> Option<Bookmark> {
    let mut name = String::new();
    let mut ip = String::new();
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("name=") {
            name = value.trim().trim_matches('"').to_string();
        } else if let Some(value) = line.strip_prefix("ip=") {
            ip = value.trim().trim_matches('"').to_string();
        }
    }
    if name.is_empty() || ip.is_empty() {
        return None;
    }
    Some(Bookmark { name, ip })
}

/// Merge `bookmark` into the `servers` list of the NBT file at `path`,
/// creating the file if absent. Never overwrites an existing entry.
pub fn merge_bookmark(path: &Path, bookmark: &Bookmark) -> MergeOutcome {
    let mut root: HashMap<String, Value> = if path.exists() {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return MergeOutcome::ReadError(e.to_string()),
        };
        match fastnbt::from_bytes::<Value>(&bytes) {
            Ok(Value::Compound(map)) => map,
            Ok(_) => return MergeOutcome::ReadError("root tag is not a compound".to_string()),
            Err(e) => return MergeOutcome::ReadError(e.to_string()),
        }
    } else {
        HashMap::new()
    };

    let servers = root
        .entry("servers".to_string())
        .or_insert_with(|| Value::List(Vec::new()));
    let Value::List(list) = servers else {
        return MergeOutcome::ReadError("'servers' tag is not a list".to_string());
    };

    for entry in list.iter() {
        if let Value::Compound(fields) = entry
            && let Some(Value::String(ip)) = fields.get("ip")
            && *ip == bookmark.ip
        {
            return MergeOutcome::AlreadyExists;
        }
    }

    let mut fields = HashMap::new();
    fields.insert("acceptTextures".to_string(), Value::Byte(1));
    fields.insert("hidden".to_string(), Value::Byte(0));
    fields.insert("ip".to_string(), Value::String(bookmark.ip.clone()));
    fields.insert("name".to_string(), Value::String(bookmark.name.clone()));
    list.push(Value::Compound(fields));

    let bytes = match fastnbt::to_bytes(&Value::Compound(root)) {
        Ok(bytes) => bytes,
        Err(e) => return MergeOutcome::WriteError(e.to_string()),
    };
    if let Err(e) = fs::write(path, bytes) {
        return MergeOutcome::WriteError(e.to_string());
    }
    MergeOutcome::Added
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dat() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("modlink-srv-{}", fastrand::u64(..)));
        fs::create_dir_all(&dir).unwrap();
        dir.join("servers.dat")
    }

    fn load_servers(path: &Path) -> Vec<HashMap<String, Value>> {
        let bytes = fs::read(path).unwrap();
        let Value::Compound(root) = fastnbt::from_bytes::<Value>(&bytes).unwrap() else {
            panic!("root not a compound");
        };
        let Some(Value::List(list)) = root.get("servers") else {
            panic!("servers not a list");
        };
        list.iter()
            .map(|entry| match entry {
                Value::Compound(fields) => fields.clone(),
                other => panic!("unexpected entry {other:?}"),
            })
            .collect()
    }

    fn bookmark(name: &str, ip: &str) -> Bookmark {
        Bookmark {
            name: name.to_string(),
            ip: ip.to_string(),
        }
    }

    #[test]
    fn test_descriptor_parsing() {
        let b = parse_descriptor("name=\"My Server\"\nip=play.example.com\n").unwrap();
        assert_eq!(b.name, "My Server");
        assert_eq!(b.ip, "play.example.com");

        assert!(parse_descriptor("name=OnlyName\n").is_none());
        assert!(parse_descriptor("ip=1.2.3.4\n").is_none());
        assert!(parse_descriptor("").is_none());
    }

    #[test]
    fn test_merge_creates_file_when_absent() {
        let path = temp_dat();
        assert!(matches!(
            merge_bookmark(&path, &bookmark("Alpha", "a.example.com")),
            MergeOutcome::Added
        ));

        let servers = load_servers(&path);
        assert_eq!(servers.len(), 1);
        assert_eq!(
            servers[0].get("name"),
            Some(&Value::String("Alpha".to_string()))
        );
        assert_eq!(servers[0].get("acceptTextures"), Some(&Value::Byte(1)));
        assert_eq!(servers[0].get("hidden"), Some(&Value::Byte(0)));

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_merge_is_idempotent_on_ip() {
        let path = temp_dat();
        assert!(matches!(
            merge_bookmark(&path, &bookmark("Alpha", "a.example.com")),
            MergeOutcome::Added
        ));
        // Same ip, different name: the first record is kept untouched
        assert!(matches!(
            merge_bookmark(&path, &bookmark("Renamed", "a.example.com")),
            MergeOutcome::AlreadyExists
        ));

        let servers = load_servers(&path);
        assert_eq!(servers.len(), 1);
        assert_eq!(
            servers[0].get("name"),
            Some(&Value::String("Alpha".to_string()))
        );

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_merge_preserves_unknown_fields() {
        let path = temp_dat();

        let mut existing = HashMap::new();
        existing.insert("ip".to_string(), Value::String("old.example.com".to_string()));
        existing.insert("name".to_string(), Value::String("Old".to_string()));
        existing.insert("icon".to_string(), Value::String("base64stuff".to_string()));
        let mut root = HashMap::new();
        root.insert(
            "servers".to_string(),
            Value::List(vec![Value::Compound(existing)]),
        );
        fs::write(&path, fastnbt::to_bytes(&Value::Compound(root)).unwrap()).unwrap();

        assert!(matches!(
            merge_bookmark(&path, &bookmark("New", "new.example.com")),
            MergeOutcome::Added
        ));

        let servers = load_servers(&path);
        assert_eq!(servers.len(), 2);
        let old = servers
            .iter()
            .find(|s| s.get("ip") == Some(&Value::String("old.example.com".to_string())))
            .unwrap();
        assert_eq!(
            old.get("icon"),
            Some(&Value::String("base64stuff".to_string()))
        );

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_unwritable_path_yields_write_error() {
        let dir = std::env::temp_dir().join(format!("modlink-srv-{}", fastrand::u64(..)));
        fs::create_dir_all(&dir).unwrap();
        // Parent of the target path is a regular file, so the write must fail
        fs::write(dir.join("blocker"), "not a directory").unwrap();
        let path = dir.join("blocker/servers.dat");

        assert!(matches!(
            merge_bookmark(&path, &bookmark("Alpha", "a.example.com")),
            MergeOutcome::WriteError(_)
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_yields_read_error() {
        let path = temp_dat();
        fs::write(&path, b"not nbt at all").unwrap();
        assert!(matches!(
            merge_bookmark(&path, &bookmark("Alpha", "a.example.com")),
            MergeOutcome::ReadError(_)
        ));
        // Nothing was clobbered
        assert_eq!(fs::read(&path).unwrap(), b"not nbt at all");

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
