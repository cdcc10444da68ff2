//! Filesystem layout under ~/.wei

use std::path::PathBuf;

/// Data directory (~/.wei)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wei")
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Session storage location
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

/// Ensure a directory exists
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
