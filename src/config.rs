use std::{
    env,
    ffi::OsString,
    fs::create_dir_all,
    path::PathBuf,
};

use crate::error::StorageError;
use crate::store::FileStore;

pub const APP_DIR_NAME: &str = "snappy-lens";
pub const STORE_FILE_NAME: &str = "storage.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_dir: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Config {
    /// Uses `store_dir` when given, otherwise the platform config directory.
    pub fn resolve(store_dir: Option<PathBuf>, log_filter: Option<String>) -> Result<Self, StorageError> {
        let store_dir = match store_dir {
            Some(dir) => dir,
            None => default_store_dir(env::var_os("XDG_CONFIG_HOME"), env::var_os("HOME"))
                .ok_or(StorageError::NoConfigDir)?,
        };
        Ok(Self {
            store_dir,
            log_filter: log_filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn store_file(&self) -> PathBuf {
        self.store_dir.join(STORE_FILE_NAME)
    }

    /// Opens the file store, creating its directory first.
    pub fn open_store(&self) -> Result<FileStore, StorageError> {
        create_dir_all(&self.store_dir).map_err(|e| StorageError::io(&self.store_dir, e))?;
        FileStore::open(self.store_file())
    }
}

fn default_store_dir(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    home.filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        assert_eq!(
            default_store_dir(Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg/snappy-lens"))
        );
        assert_eq!(
            default_store_dir(Some("".into()), Some("/home/u".into())),
            Some(PathBuf::from("/home/u/.config/snappy-lens"))
        );
        assert_eq!(default_store_dir(None, None), None);
    }

    #[test]
    fn explicit_dir_and_default_filter() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/x")), None).unwrap();
        assert_eq!(config.store_file(), PathBuf::from("/tmp/x/storage.json"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn open_store_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(Some(dir.path().join("a/b")), None).unwrap();
        let store = config.open_store().unwrap();
        assert!(config.store_dir.is_dir());
        assert_eq!(store.path(), config.store_file());
    }
}
