//! Append-order file sink staging into a `.part` file.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::transport::PacketSink;

/// Writes the download into `<name>.part`, promoted to `<name>` on commit.
/// A retried attempt calls `reset`, which discards the staging file so bytes
/// from an aborted attempt never leak into the final one.
pub struct FileStore {
    final_path: PathBuf,
    part_path: PathBuf,
    file: Option<File>,
}

impl FileStore {
    pub fn create(dir: &Path, filename: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create download dir {}", dir.display()))?;
        Ok(Self {
            final_path: dir.join(filename),
            part_path: dir.join(format!("{}.part", filename)),
            file: None,
        })
    }

    /// Where the committed file lands.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }
}

impl PacketSink for FileStore {
    fn reset(&mut self) -> Result<()> {
        self.file = None;
        match fs::remove_file(&self.part_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("discard {}", self.part_path.display()))
            }
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<()> {
        if self.file.is_none() {
            tracing::info!("creating file {}", self.part_path.display());
            let f = File::create(&self.part_path)
                .with_context(|| format!("create {}", self.part_path.display()))?;
            self.file = Some(f);
        }
        if let Some(f) = self.file.as_mut() {
            f.write_all(data)
                .with_context(|| format!("write {}", self.part_path.display()))?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let file = match self.file.take() {
            Some(f) => f,
            // Zero-length download: commit still produces the file.
            None => File::create(&self.part_path)
                .with_context(|| format!("create {}", self.part_path.display()))?,
        };
        file.sync_all()
            .with_context(|| format!("sync {}", self.part_path.display()))?;
        drop(file);

        fs::rename(&self.part_path, &self.final_path).with_context(|| {
            format!(
                "rename {} to {}",
                self.part_path.display(),
                self.final_path.display()
            )
        })?;
        tracing::info!("saved {}", self.final_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_and_commit_produces_the_final_file() {
        let dir = tempdir().unwrap();
        let mut sink = FileStore::create(dir.path(), "image.bin").unwrap();
        sink.reset().unwrap();
        sink.store(b"hello ").unwrap();
        sink.store(b"world").unwrap();
        sink.commit().unwrap();

        let content = fs::read(dir.path().join("image.bin")).unwrap();
        assert_eq!(content, b"hello world");
        assert!(!dir.path().join("image.bin.part").exists());
    }

    #[test]
    fn reset_discards_a_stale_attempt() {
        let dir = tempdir().unwrap();
        let mut sink = FileStore::create(dir.path(), "image.bin").unwrap();
        sink.store(b"stale bytes").unwrap();
        sink.reset().unwrap();
        assert!(!dir.path().join("image.bin.part").exists());

        sink.store(b"fresh").unwrap();
        sink.commit().unwrap();
        let content = fs::read(dir.path().join("image.bin")).unwrap();
        assert_eq!(content, b"fresh");
    }

    #[test]
    fn commit_without_data_creates_an_empty_file() {
        let dir = tempdir().unwrap();
        let mut sink = FileStore::create(dir.path(), "empty.bin").unwrap();
        sink.commit().unwrap();
        let content = fs::read(dir.path().join("empty.bin")).unwrap();
        assert!(content.is_empty());
    }
}
