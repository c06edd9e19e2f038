//! Sync orchestration
//!
//! Runs the full pipeline for one bundle: mods folder handling, archive
//! fetch, selective extraction with world reconciliation, the one-time
//! installer, and the server bookmark merge. Exactly one sync may run at a
//! time; progress and log lines stream to the caller over a channel so the
//! control thread never blocks on the run.

use crate::archive::BundleArchive;
use crate::installer::{self, InstallerAction, JarRunError, JarRunner};
use crate::mods_dir::{self, ModsPolicy};
use crate::servers::{self, MergeOutcome};
use crate::worlds;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Characters that can never appear in a bundle name (path separators and
/// filesystem-reserved characters).
const RESERVED_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Checked before any I/O happens; a bad name is a validation outcome, not a
/// fatal error.
pub fn validate_bundle_name(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    !name.chars().any(|c| RESERVED_NAME_CHARS.contains(&c))
}

/// Supplies the raw archive bytes. The production implementation is
/// `remote::GitHubSource`; tests feed an in-memory zip.
pub trait ArchiveSource {
    fn fetch_archive(&self) -> Result<Vec<u8>, Box<dyn Error>>;
}

#[derive(Debug)]
pub enum SyncEvent {
    Started,
    Log(String),
    /// Monotonic, 0 to 100.
    Progress(u8),
    BookmarkAdded { name: String, ip: String },
    /// Always the last event of a run.
    Finished(SyncOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Success(String),
    /// Archive fetched fine but contains nothing under modpacks/<bundle>/.
    BundleNotFound(String),
    InvalidName(String),
    Fatal(String),
}

#[derive(Clone)]
pub struct SyncRequest {
    pub bundle: String,
    /// Destination installation directory, always explicit.
    pub minecraft_dir: PathBuf,
    pub mods_policy: ModsPolicy,
}

/// Returned when a sync is requested while another one is running.
#[derive(Debug)]
pub struct SyncBusy;

impl fmt::Display for SyncBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a sync is already running")
    }
}

impl Error for SyncBusy {}

/// One-run-at-a-time guard plus worker spawning. The destination tree has no
/// in-process lock of its own; refusing concurrent runs here is the whole
/// concurrency discipline.
pub struct SyncRunner {
    active: Arc<AtomicBool>,
}

impl SyncRunner {
    pub fn new() -> SyncRunner {
        SyncRunner {
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn a sync on a worker thread and hand back its event stream.
    pub fn start<S, R>(
        &self,
        request: SyncRequest,
        source: S,
        runner: R,
    ) -> Result<Receiver<SyncEvent>, SyncBusy>
    where
        S: ArchiveSource + Send + 'static,
        R: JarRunner + Send + 'static,
    {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncBusy);
        }

        let (tx, rx) = mpsc::channel();
        let active = self.active.clone();
        thread::spawn(move || {
            run_sync(&request, &source, &runner, &tx);
            active.store(false, Ordering::SeqCst);
        });
        Ok(rx)
    }
}

/// Run the whole pipeline synchronously, streaming events to `tx`.
/// Emits `Started` first and exactly one `Finished` last.
pub fn run_sync(
    request: &SyncRequest,
    source: &dyn ArchiveSource,
    runner: &dyn JarRunner,
    tx: &Sender<SyncEvent>,
) -> SyncOutcome {
    let _ = tx.send(SyncEvent::Started);
    let mut emitter = Emitter {
        tx,
        last_progress: -1,
    };
    let outcome = execute(request, source, runner, &mut emitter);
    let _ = tx.send(SyncEvent::Finished(outcome.clone()));
    outcome
}

struct Emitter<'a> {
    tx: &'a Sender<SyncEvent>,
    last_progress: i16,
}

impl Emitter<'_> {
    fn log(&self, text: impl Into<String>) {
        let _ = self.tx.send(SyncEvent::Log(text.into()));
    }

    /// Progress never goes backwards; repeated values are collapsed.
    fn progress(&mut self, percent: u8) {
        if i16::from(percent) > self.last_progress {
            self.last_progress = i16::from(percent);
            let _ = self.tx.send(SyncEvent::Progress(percent));
        }
    }
}

fn execute(
    request: &SyncRequest,
    source: &dyn ArchiveSource,
    runner: &dyn JarRunner,
    em: &mut Emitter,
) -> SyncOutcome {
    if !validate_bundle_name(&request.bundle) {
        return SyncOutcome::InvalidName(request.bundle.clone());
    }

    let root = &request.minecraft_dir;
    em.progress(0);

    em.log("Preparing the mods folder...");
    if let Err(e) = mods_dir::prepare_mods_dir(root, request.mods_policy) {
        return SyncOutcome::Fatal(e.to_string());
    }
    em.log(match request.mods_policy {
        ModsPolicy::RenameAside => "Previous mods folder renamed aside",
        ModsPolicy::Delete => "Previous mods folder deleted",
    });
    em.progress(5);

    em.log("Requesting the modpack archive...");
    let bytes = match source.fetch_archive() {
        Ok(bytes) => bytes,
        Err(e) => return SyncOutcome::Fatal(e.to_string()),
    };
    em.progress(15);

    let mut archive = match BundleArchive::open(bytes) {
        Ok(archive) => archive,
        Err(e) => return SyncOutcome::Fatal(e.to_string()),
    };
    let prefix = archive.bundle_prefix(&request.bundle);

    let archive_worlds = archive.world_names(&prefix);
    em.log(format!(
        "Worlds in this modpack: {}",
        worlds::format_world_list(&archive_worlds)
    ));
    let plan = worlds::reconcile(&archive_worlds, &root.join("saves"));
    if let Some(line) = worlds::format_world_action(
        &plan.existing,
        "already exists locally and was skipped",
        "already exist locally and were skipped",
    ) {
        em.log(line);
    }
    if let Some(line) =
        worlds::format_world_action(&plan.to_extract, "will be added", "will be added")
    {
        em.log(line);
    }

    let stats = {
        let result = archive.extract_subset(root, &prefix, &plan.existing, |done, total| {
            if total > 0 {
                em.progress(15 + ((done * 55) / total) as u8);
            }
        });
        match result {
            Ok(stats) => stats,
            Err(e) => return SyncOutcome::Fatal(e.to_string()),
        }
    };
    if !stats.matched_any {
        return SyncOutcome::BundleNotFound(request.bundle.clone());
    }
    em.progress(75);

    run_installer_stage(root, runner, em);
    em.progress(90);

    run_bookmark_stage(root, em);
    em.progress(100);

    let summary = format!(
        "Modpack '{}' installed into {}",
        request.bundle,
        root.display()
    );
    em.log(summary.clone());
    SyncOutcome::Success(summary)
}

/// Installer failures never abort the run; the artifact is deleted in every
/// branch that found one.
fn run_installer_stage(root: &Path, runner: &dyn JarRunner, em: &Emitter) {
    let versions_dir = root.join("versions");
    match installer::resolve_installer(&versions_dir) {
        InstallerAction::Absent => {
            em.log("No installer found, launch skipped");
        }
        InstallerAction::Skip { jar, version } => {
            em.log(format!(
                "Version folder '{version}' already exists, the installer will not run"
            ));
            if let Err(e) = fs::remove_file(&jar) {
                em.log(format!("Could not delete the installer: {e}"));
            }
        }
        InstallerAction::Run { jar, version } => {
            em.log(format!("Running the installer for version '{version}'..."));
            match runner.run_jar(&jar) {
                Ok(()) => {}
                Err(JarRunError::ToolMissing) => {
                    em.log(JarRunError::ToolMissing.to_string());
                }
                Err(JarRunError::Failed(msg)) => {
                    em.log(format!("Installer launch failed: {msg}"));
                }
            }
            if let Err(e) = fs::remove_file(&jar) {
                em.log(format!("Could not delete the installer: {e}"));
            }
        }
    }
}

/// The server.txt descriptor is consumed exactly once: deleted afterwards no
/// matter how the merge went.
fn run_bookmark_stage(root: &Path, em: &Emitter) {
    let descriptor = root.join("server.txt");
    if !descriptor.exists() {
        return;
    }

    match fs::read_to_string(&descriptor) {
        Ok(text) => match servers::parse_descriptor(&text) {
            Some(bookmark) => {
                match servers::merge_bookmark(&root.join("servers.dat"), &bookmark) {
                    MergeOutcome::Added => {
                        em.log(format!("Server '{}' added to the server list", bookmark.name));
                        let _ = em.tx.send(SyncEvent::BookmarkAdded {
                            name: bookmark.name,
                            ip: bookmark.ip,
                        });
                    }
                    MergeOutcome::AlreadyExists => {
                        em.log("Server already present in the server list");
                    }
                    MergeOutcome::ReadError(msg) => {
                        em.log(format!("Could not read servers.dat: {msg}"));
                    }
                    MergeOutcome::WriteError(msg) => {
                        em.log(format!("Could not update servers.dat: {msg}"));
                    }
                }
            }
            None => em.log("Malformed server.txt, bookmark skipped"),
        },
        Err(e) => em.log(format!("Could not read server.txt: {e}")),
    }

    if let Err(e) = fs::remove_file(&descriptor) {
        em.log(format!("Could not delete server.txt: {e}"));
    }
}
