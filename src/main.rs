mod archive;
mod config;
mod installer;
mod mods_dir;
mod paths;
mod remote;
mod servers;
mod sync;
mod worlds;

use crate::config::{load_cfg, save_cfg};
use crate::installer::JavaRunner;
use crate::mods_dir::ModsPolicy;
use crate::paths::PATH_MINECRAFT;
use crate::remote::GitHubSource;
use crate::sync::{SyncEvent, SyncOutcome, SyncRequest, SyncRunner};

use std::io::Write;
use std::path::PathBuf;

const USAGE_TEXT: &str = "modlink - modpack installer

Usage:
  modlink list
  modlink install <bundle> [options]

Options:
  --minecraft-dir <path>  Destination installation directory
  --repo <owner/name>     GitHub repository holding the modpacks (persisted)
  --branch <name>         Branch to download (persisted)
  --keep-mods             Rename the previous mods folder aside (persisted)
  --delete-mods           Delete the previous mods folder (persisted)
  --help                  Show this help";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help") {
        println!("{USAGE_TEXT}");
        return;
    }

    let mut cfg = load_cfg();
    let mut cfg_changed = false;
    let mut minecraft_dir: Option<PathBuf> = None;
    let mut bundle: Option<String> = None;
    let command = args[0].clone();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--minecraft-dir" | "--repo" | "--branch" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("[modlink] {} needs a value", args[i]);
                    std::process::exit(2);
                };
                match args[i].as_str() {
                    "--minecraft-dir" => minecraft_dir = Some(PathBuf::from(value)),
                    "--repo" => {
                        cfg.repo = value.clone();
                        cfg_changed = true;
                    }
                    _ => {
                        cfg.branch = value.clone();
                        cfg_changed = true;
                    }
                }
                i += 2;
            }
            "--keep-mods" => {
                cfg.rename_mods = true;
                cfg_changed = true;
                i += 1;
            }
            "--delete-mods" => {
                cfg.rename_mods = false;
                cfg_changed = true;
                i += 1;
            }
            other if !other.starts_with('-') && bundle.is_none() => {
                bundle = Some(other.to_string());
                i += 1;
            }
            other => {
                eprintln!("[modlink] Unknown option '{other}'");
                println!("{USAGE_TEXT}");
                std::process::exit(2);
            }
        }
    }

    if cfg_changed && let Err(e) = save_cfg(&cfg) {
        eprintln!("[modlink] Could not save settings: {e}");
    }

    if cfg.repo.is_empty() {
        eprintln!("[modlink] No repository configured. Pass --repo <owner/name> once.");
        std::process::exit(2);
    }

    let token = std::env::var("MODLINK_TOKEN").unwrap_or_else(|_| cfg.token.clone());
    let source = GitHubSource {
        repo: cfg.repo.clone(),
        branch: cfg.branch.clone(),
        token,
    };

    match command.as_str() {
        "list" => cmd_list(&source),
        "install" => {
            let Some(bundle) = bundle else {
                eprintln!("[modlink] install needs a bundle name");
                std::process::exit(2);
            };
            let dir = minecraft_dir.unwrap_or_else(|| PATH_MINECRAFT.clone());
            let policy = if cfg.rename_mods {
                ModsPolicy::RenameAside
            } else {
                ModsPolicy::Delete
            };
            cmd_install(bundle, dir, policy, source);
        }
        other => {
            eprintln!("[modlink] Unknown command '{other}'");
            println!("{USAGE_TEXT}");
            std::process::exit(2);
        }
    }
}

fn cmd_list(source: &GitHubSource) {
    let bundles = source.list_bundles();
    if bundles.is_empty() {
        println!("No modpacks available");
        return;
    }
    for bundle in bundles {
        println!("{bundle}");
    }
}

fn cmd_install(bundle: String, dir: PathBuf, policy: ModsPolicy, source: GitHubSource) {
    let runner = SyncRunner::new();
    let request = SyncRequest {
        bundle,
        minecraft_dir: dir,
        mods_policy: policy,
    };

    let rx = match runner.start(request, source, JavaRunner) {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("[modlink] {e}");
            std::process::exit(1);
        }
    };

    let mut progress_open = false;
    for event in rx {
        match event {
            SyncEvent::Started => println!("[modlink] Starting install..."),
            SyncEvent::Log(line) => {
                if progress_open {
                    println!();
                    progress_open = false;
                }
                println!("  {line}");
            }
            SyncEvent::Progress(percent) => {
                print!("\r  [{percent:>3}%]");
                std::io::stdout().flush().ok();
                progress_open = true;
            }
            SyncEvent::BookmarkAdded { name, ip } => {
                if progress_open {
                    println!();
                    progress_open = false;
                }
                println!("  Added server '{name}' ({ip}) to the server list");
            }
            SyncEvent::Finished(outcome) => {
                if progress_open {
                    println!();
                }
                match outcome {
                    SyncOutcome::Success(summary) => {
                        println!("[modlink] {summary}");
                    }
                    SyncOutcome::BundleNotFound(bundle) => {
                        eprintln!("[modlink] Modpack '{bundle}' was not found in the archive");
                        std::process::exit(1);
                    }
                    SyncOutcome::InvalidName(bundle) => {
                        eprintln!("[modlink] '{bundle}' is not a valid modpack name");
                        std::process::exit(2);
                    }
                    SyncOutcome::Fatal(message) => {
                        eprintln!("[modlink] Install failed: {message}");
                        std::process::exit(1);
                    }
                }
            }
        }
    }
}
