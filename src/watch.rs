//! Automatic configuration-file re-reading.
//!
//! Enabled with the `watch` cargo feature. [`Registry::watch_configuration_files`]
//! spawns a filesystem watcher over every registered file's directory and
//! re-reads a file whenever it is modified or recreated. Watching the
//! parent directory rather than the file itself survives the
//! rename-into-place writes editors and deployment tools do.

use std::path::Path;

use notify::{recommended_watcher, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;
use crate::layers::file::FileLayer;
use crate::registry::Registry;

/// Handle keeping the filesystem watcher alive. Dropping it stops the
/// watching; resolution then sees whatever was last read.
pub struct Watch {
    _watcher: RecommendedWatcher,
}

impl Registry {
    /// Start re-reading registered configuration files whenever they change
    /// on disk.
    #[cfg(feature = "watch")]
    pub fn watch_configuration_files(&self) -> Result<Watch> {
        let layers: Vec<FileLayer> = self.file_layers().to_vec();
        let mut watcher = recommended_watcher(move |event: notify::Result<notify::Event>| {
            let Ok(event) = event else {
                return;
            };
            if !event.kind.is_modify() && !event.kind.is_create() {
                return;
            }
            for path in &event.paths {
                let changed = std::fs::canonicalize(path).ok();
                for layer in &layers {
                    let registered = std::fs::canonicalize(layer.path().as_std_path()).ok();
                    if let (Some(changed), Some(registered)) = (&changed, &registered)
                        && changed == registered
                    {
                        layer.reload();
                    }
                }
            }
        })?;
        for layer in self.file_layers() {
            let dir = layer
                .path()
                .as_std_path()
                .parent()
                .unwrap_or(Path::new("."));
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }
        Ok(Watch { _watcher: watcher })
    }
}
