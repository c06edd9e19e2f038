//! Modpack archive handling
//!
//! Wraps the fetched zipball and extracts a single bundle's subtree into the
//! destination directory. World folders that already exist locally are
//! filtered out by the caller via the skip set.

use std::collections::BTreeSet;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

pub struct BundleArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    root: String,
}

/// Result of a subset extraction.
pub struct ExtractStats {
    /// Regular files written to disk (directories not counted).
    pub files_written: usize,
    /// Whether any archive entry matched the bundle prefix at all.
    /// False means the requested bundle is not in the archive.
    pub matched_any: bool,
}

impl BundleArchive {
    /// Load archive bytes and locate the single top-level root folder that
    /// GitHub zipballs wrap everything in.
    pub fn open(bytes: Vec<u8>) -> Result<BundleArchive, Box<dyn Error>> {
        let zip = ZipArchive::new(Cursor::new(bytes))?;
        let root = find_root(&zip)
            .ok_or("could not determine the root folder of the archive")?;
        Ok(BundleArchive { zip, root })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Archive path prefix that holds the given bundle's subtree.
    pub fn bundle_prefix(&self, bundle: &str) -> String {
        format!("{}modpacks/{}/", self.root, bundle)
    }

    /// World folder names present under `saves/` within the bundle subtree.
    pub fn world_names(&self, prefix: &str) -> BTreeSet<String> {
        let mut worlds = BTreeSet::new();
        for name in self.zip.file_names() {
            let Some(relative) = name.strip_prefix(prefix) else {
                continue;
            };
            if let Some(rest) = relative.strip_prefix("saves/") {
                let world = rest.split('/').next().unwrap_or_default();
                if !world.trim().is_empty() {
                    worlds.insert(world.to_string());
                }
            }
        }
        worlds
    }

    /// Extract every entry under `prefix` into `dest`, skipping the subtrees
    /// of worlds named in `worlds_to_skip`. Existing files are overwritten;
    /// existing directories are left alone. `progress` is called with
    /// (processed, total) counts over the matching entries.
    pub fn extract_subset(
        &mut self,
        dest: &Path,
        prefix: &str,
        worlds_to_skip: &BTreeSet<String>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ExtractStats, Box<dyn Error>> {
        let members: Vec<String> = self
            .zip
            .file_names()
            .filter(|n| n.starts_with(prefix))
            .map(|n| n.to_string())
            .collect();

        let total = members.len();
        let mut processed = 0usize;
        let mut files_written = 0usize;

        for member in &members {
            let relative = &member[prefix.len()..];
            if relative.is_empty() {
                // The bundle folder marker itself
                continue;
            }

            if let Some(rest) = relative.strip_prefix("saves/") {
                let world = rest.split('/').next().unwrap_or_default();
                if worlds_to_skip.contains(world) {
                    continue;
                }
            }

            // Entry names are untrusted; anything that could step outside
            // the destination tree is dropped, like zip's enclosed_name rule
            let Some(target) = safe_join(dest, relative) else {
                continue;
            };
            if member.ends_with('/') {
                fs::create_dir_all(&target)
                    .map_err(|e| format!("mkdir '{}' failed: {e}", target.display()))?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| format!("mkdir '{}' failed: {e}", parent.display()))?;
                }
                let mut entry = self.zip.by_name(member)?;
                let mut out = File::create(&target)
                    .map_err(|e| format!("write '{}' failed: {e}", target.display()))?;
                io::copy(&mut entry, &mut out)
                    .map_err(|e| format!("extract '{}' failed: {e}", target.display()))?;
                files_written += 1;
            }

            processed += 1;
            progress(processed, total);
        }

        Ok(ExtractStats {
            files_written,
            matched_any: total > 0,
        })
    }
}

/// Join an archive-relative path onto the destination, refusing anything
/// that is not a plain chain of normal components (`..`, absolute paths,
/// drive prefixes).
fn safe_join(dest: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(dest.join(rel))
}

/// A zipball has exactly one top-level directory entry; everything else
/// lives beneath it. Returns its name including the trailing slash.
fn find_root(zip: &ZipArchive<Cursor<Vec<u8>>>) -> Option<String> {
    for name in zip.file_names() {
        if name.ends_with('/') && !name[..name.len() - 1].contains('/') {
            return Some(name.to_string());
        }
    }
    None
}

/// Test fixture: build an in-memory zip from (path, content) pairs, `None`
/// content meaning a directory entry.
#[cfg(test)]
pub(crate) fn build_test_zip(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        match content {
            Some(data) => {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
            None => {
                writer
                    .add_directory(name.trim_end_matches('/'), options)
                    .unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}
