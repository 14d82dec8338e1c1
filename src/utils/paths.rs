use directories::BaseDirs;
use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "OpenTranslate";
/// Points the config dir somewhere else (portable installs, tests).
pub const ENV_CONFIG_DIR: &str = "OPEN_TRANSLATE_CONFIG_DIR";

/// Application config directory (OS standard)
/// Linux: ~/.config/OpenTranslate
/// macOS: ~/Library/Application Support/OpenTranslate
/// Windows: %APPDATA%\\OpenTranslate
pub fn app_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(base) = BaseDirs::new() {
        return base.config_dir().join(APP_DIR_NAME);
    }
    // Fallback: current working directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
