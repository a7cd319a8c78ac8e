use std::path::PathBuf;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

/// Burst interval used when neither CLI nor config sets one.
pub(crate) const DEFAULT_INTERVAL_MS: &str = "1000";
pub(crate) const DEFAULT_BATCH_SIZE: &str = "3";
pub(crate) const DEFAULT_MAX_REQUESTS: &str = "10";

pub(crate) fn default_db_path() -> String {
    default_base_dir()
        .join("runs.db")
        .to_string_lossy()
        .into_owned()
}

fn default_base_dir() -> PathBuf {
    if let Some(home) = user_home_dir() {
        return home.join(".volley");
    }

    PathBuf::from(".volley")
}

fn user_home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(value) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(value));
        }
    }

    std::env::var_os("HOME").map(PathBuf::from)
}
