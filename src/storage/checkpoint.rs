//! Checkpoint file persistence
//!
//! The checkpoint is rewritten wholesale on every save: the snapshot is written to a
//! sibling temp file, synced, then renamed over the previous checkpoint. A crash at
//! any point leaves either the old or the new checkpoint, never a mix.

use crate::state::CheckpointSnapshot;
use crate::storage::traits::{CheckpointStore, StorageResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// JSON checkpoint stored at a fixed path
pub struct JsonCheckpointFile {
    path: PathBuf,
}

impl JsonCheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for JsonCheckpointFile {
    fn load(&self) -> StorageResult<Option<CheckpointSnapshot>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: CheckpointSnapshot = serde_json::from_slice(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &CheckpointSnapshot) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, snapshot)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
