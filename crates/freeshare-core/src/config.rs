//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_SHARE_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST backend
    pub backend_url: String,
    /// Origin public share pages are served from
    pub share_origin: String,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Where downloaded files are saved
    pub download_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let download_dir = dirs::download_dir().unwrap_or_else(|| data_dir.join("Downloads"));

        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
            database_path: data_dir.join("freeshare.db"),
            download_dir,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("FreeShare"))
            .unwrap_or_else(|| PathBuf::from(".freeshare"))
    }

    /// Defaults overridden by `FREESHARE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var("FREESHARE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);
        let mut config = Self::new(data_dir);

        if let Some(url) = var("FREESHARE_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(origin) = var("FREESHARE_SHARE_ORIGIN") {
            config.share_origin = origin;
        }
        if let Some(dir) = var("FREESHARE_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Per-platform user directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            home().map(|h| h.join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| home().map(|h| h.join(".local/share")))
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }

    pub fn download_dir() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DOWNLOAD_DIR")
                .ok()
                .map(PathBuf::from)
                .or_else(|| home().map(|h| h.join("Downloads")))
        }
        #[cfg(not(target_os = "linux"))]
        {
            home().map(|h| h.join("Downloads"))
        }
    }

    fn home() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        let var = "USERPROFILE";
        #[cfg(not(target_os = "windows"))]
        let var = "HOME";

        std::env::var(var).ok().map(PathBuf::from)
    }
}
