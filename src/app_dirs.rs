use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory holding named session configs. Falls back to `./configs`
    /// when the platform offers no home directory.
    pub fn config_dir() -> PathBuf {
        ProjectDirs::from("", "", "zetatrack")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("configs"))
    }
}
