use std::path::PathBuf;

/// Returns the application data directory.
/// Uses `dirs::data_dir()` + "localbot" (e.g., %APPDATA%/localbot or ~/.local/share/localbot).
/// Only locates the directory; nothing is created on disk.
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(|| std::env::var("APPDATA").ok().map(PathBuf::from))
        .map(|dir| dir.join("localbot"))
}
