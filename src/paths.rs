use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

pub static PATH_HOME: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(env::var("HOME").unwrap()));

/// Directory holding settings.json.
pub static PATH_CONFIG: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config_home).join("modlink");
    }
    if let Ok(appdata) = env::var("APPDATA") {
        return PathBuf::from(appdata).join("modlink");
    }
    PATH_HOME.join(".config/modlink")
});

/// Default Minecraft installation directory. The sync engine always receives
/// the destination explicitly; this is only the CLI default.
pub static PATH_MINECRAFT: LazyLock<PathBuf> = LazyLock::new(|| {
    // The vanilla launcher keeps its data under %APPDATA%\.minecraft on Windows
    if let Ok(appdata) = env::var("APPDATA") {
        return PathBuf::from(appdata).join(".minecraft");
    }
    PATH_HOME.join(".minecraft")
});
