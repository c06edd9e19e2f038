//! One-time installer payload
//!
//! A freshly extracted bundle may drop a `<version>-installer.jar` into the
//! `versions/` folder. It is run at most once: when `versions/<version>/`
//! already exists the jar is discarded without running. Either way the jar
//! never survives the sync run.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const INSTALLER_SUFFIX: &str = "-installer.jar";

pub enum InstallerAction {
    /// No installer jar in the versions folder.
    Absent,
    /// The version folder already exists; delete the jar without running it.
    Skip { jar: PathBuf, version: String },
    /// Run the jar, then delete it regardless of how the run went.
    Run { jar: PathBuf, version: String },
}

/// Scan `versions/` for an installer jar. Only the first match by enumeration
/// order is considered; bundles are expected to ship at most one.
pub fn resolve_installer(versions_dir: &Path) -> InstallerAction {
    let Ok(entries) = fs::read_dir(versions_dir) else {
        return InstallerAction::Absent;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        let Some(base) = name.strip_suffix(INSTALLER_SUFFIX) else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }
        let version = base.to_string();
        if versions_dir.join(base).is_dir() {
            return InstallerAction::Skip {
                jar: entry.path(),
                version,
            };
        }
        return InstallerAction::Run {
            jar: entry.path(),
            version,
        };
    }

    InstallerAction::Absent
}

pub enum JarRunError {
    /// The java runtime is missing entirely. Reported to the user as a
    /// configuration problem, distinct from an installer that ran and failed.
    ToolMissing,
    Failed(String),
}

impl fmt::Display for JarRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JarRunError::ToolMissing => {
                write!(f, "Java is not installed or not available on PATH")
            }
            JarRunError::Failed(msg) => write!(f, "installer launch failed: {msg}"),
        }
    }
}

/// Launches installer jars. Trait seam so the pipeline can be tested without
/// spawning real processes.
pub trait JarRunner {
    fn run_jar(&self, jar: &Path) -> Result<(), JarRunError>;
}

/// Runs jars through the `java` binary on PATH, with no visible console.
pub struct JavaRunner;

impl JarRunner for JavaRunner {
    fn run_jar(&self, jar: &Path) -> Result<(), JarRunError> {
        match quiet_command("java").arg("-version").status() {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(JarRunError::ToolMissing);
            }
            Err(e) => return Err(JarRunError::Failed(e.to_string())),
        }

        // The installer's exit code is deliberately ignored
        match quiet_command("java").arg("-jar").arg(jar).status() {
            Ok(_) => Ok(()),
            Err(e) => Err(JarRunError::Failed(e.to_string())),
        }
    }
}

fn quiet_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}
