//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\pal-assistant\
//!   macOS:   ~/Library/Application Support/pal-assistant/
//!   Linux:   ~/.config/pal-assistant/
//!
//! Cache dir (converted audio awaiting upload):
//!   Windows: %LOCALAPPDATA%\pal-assistant\audio\
//!   macOS:   ~/Library/Caches/pal-assistant/audio/
//!   Linux:   ~/.cache/pal-assistant/audio/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory where converted audio files are staged before upload.
    pub audio_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "pal-assistant";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory (config) or the system temp
    /// directory (audio) when the platform cannot provide a standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let audio_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(Self::APP_NAME)
            .join("audio");

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            audio_dir,
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
        assert!(paths.audio_dir.ends_with("audio"));
    }
}
