use std::path::{Path, PathBuf};

/// XDG app name used for the user-level config directory.
pub const APP_NAME: &str = "conductor";
/// File name shared by the user-level and project-level configs.
pub const CONFIG_FILE_NAME: &str = "conductor.toml";

fn project_config_dir(app_name: &str) -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// User-level config directory, `None` when no home directory is available
/// (e.g. minimal containers).
pub fn config_dir() -> Option<PathBuf> {
    project_config_dir(APP_NAME)
}

/// `~/.config/conductor/conductor.toml` on Linux.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Project-level config: `<project_root>/conductor.toml`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_config_path_is_at_root() {
        let path = project_config_path(Path::new("/srv/app"));
        assert_eq!(path, PathBuf::from("/srv/app/conductor.toml"));
    }

    #[test]
    fn user_config_path_ends_with_file_name() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with(CONFIG_FILE_NAME));
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }
}
