use crate::paths::PATH_CONFIG;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

#[derive(Clone, Serialize, Deserialize)]
pub struct ModlinkConfig {
    /// GitHub repository holding the modpacks, "owner/name" form.
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Access token for private repositories. Overridable via MODLINK_TOKEN.
    #[serde(default)]
    pub token: String,
    /// When true the previous mods folder is renamed aside instead of deleted.
    #[serde(default = "default_true")]
    pub rename_mods: bool,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ModlinkConfig {
    fn default() -> Self {
        ModlinkConfig {
            repo: String::new(),
            branch: default_branch(),
            token: String::new(),
            rename_mods: true,
        }
    }
}

pub fn load_cfg() -> ModlinkConfig {
    let path = PATH_CONFIG.join("settings.json");

    if let Ok(file) = File::open(path) {
        if let Ok(config) = serde_json::from_reader::<_, ModlinkConfig>(BufReader::new(file)) {
            return config;
        }
    }

    // Return default settings if file doesn't exist or has error
    ModlinkConfig::default()
}

pub fn save_cfg(config: &ModlinkConfig) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(&*PATH_CONFIG)?;
    let path = PATH_CONFIG.join("settings.json");
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}
