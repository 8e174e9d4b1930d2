//! Configuration-file source adapter.
//!
//! Each registered file is held open as a [`FileLayer`]: the parsed INI
//! contents live behind a lock so the resolver can read them while a
//! reload (explicit or watcher-driven) swaps them out. A reload that
//! fails to parse keeps the previous contents and logs a warning, so a
//! half-written file never wipes out known-good values.

use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use configparser::ini::Ini;

#[derive(Clone)]
pub(crate) struct FileLayer {
    path: Utf8PathBuf,
    ini: Arc<RwLock<Ini>>,
}

impl FileLayer {
    /// Read and parse the file at `path`.
    pub(crate) fn open(path: Utf8PathBuf) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.load(path.as_std_path())?;
        Ok(Self {
            path,
            ini: Arc::new(RwLock::new(ini)),
        })
    }

    /// Re-read the file from disk, keeping the current contents if the
    /// read or parse fails.
    pub(crate) fn reload(&self) {
        let mut ini = Ini::new();
        match ini.load(self.path.as_std_path()) {
            Ok(_) => {
                let mut guard = self.ini.write().unwrap_or_else(PoisonError::into_inner);
                *guard = ini;
                tracing::debug!(path = %self.path, "configuration file reloaded");
            }
            Err(error) => {
                tracing::warn!(path = %self.path, %error, "configuration file reload failed, keeping previous contents");
            }
        }
    }

    pub(crate) fn get(&self, section: &str, key: &str) -> Option<String> {
        let guard = self.ini.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(section, key)
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_ini(contents: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("app.ini")).unwrap();
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_sections_and_keys() {
        let (_dir, path) = write_ini("[default]\nport = 8080\n\n[database]\nhost = db.local\n");
        let layer = FileLayer::open(path).unwrap();
        assert_eq!(layer.get("default", "port"), Some("8080".into()));
        assert_eq!(layer.get("database", "host"), Some("db.local".into()));
        assert_eq!(layer.get("default", "missing"), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileLayer::open(Utf8PathBuf::from("/nonexistent/app.ini")).is_err());
    }

    #[test]
    fn reload_picks_up_changes() {
        let (_dir, path) = write_ini("[default]\nport = 8080\n");
        let layer = FileLayer::open(path.clone()).unwrap();
        assert_eq!(layer.get("default", "port"), Some("8080".into()));

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[default]\nport = 9090").unwrap();
        drop(file);

        layer.reload();
        assert_eq!(layer.get("default", "port"), Some("9090".into()));
    }

    #[test]
    fn failed_reload_keeps_previous_contents() {
        let (dir, path) = write_ini("[default]\nport = 8080\n");
        let layer = FileLayer::open(path.clone()).unwrap();

        std::fs::remove_file(&path).unwrap();
        layer.reload();
        assert_eq!(layer.get("default", "port"), Some("8080".into()));
        drop(dir);
    }
}
