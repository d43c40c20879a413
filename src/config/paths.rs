//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\transcript-qa\
//!   macOS:   ~/Library/Application Support/transcript-qa/
//!   Linux:   ~/.config/transcript-qa/
//!
//! Data dir (dictionary + backups):
//!   Windows: %LOCALAPPDATA%\transcript-qa\
//!   macOS:   ~/Library/Application Support/transcript-qa/
//!   Linux:   ~/.local/share/transcript-qa/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory holding the dictionary and its backups.
    pub data_dir: PathBuf,
    /// Full path to `dictionary.json`.
    pub dictionary_file: PathBuf,
    /// Directory for timestamped dictionary backups.
    pub backups_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "transcript-qa";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let dictionary_file = data_dir.join("dictionary.json");
        let backups_dir = data_dir.join("backups");

        Self {
            config_dir,
            settings_file,
            data_dir,
            dictionary_file,
            backups_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .dictionary_file
            .file_name()
            .is_some_and(|n| n == "dictionary.json"));
        assert!(paths.backups_dir.starts_with(&paths.data_dir));
    }
}
