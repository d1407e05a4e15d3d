use crate::prelude::*;
use crate::renogy::registers::BLOCK_LEN;

use std::path::{Path, PathBuf};

/// Directory of raw register captures, one 70-byte `.bin` file each.
#[derive(Clone, Debug)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves a capture as `<YYYY-MM-DD>-<crc>.bin` and returns its path.
    /// Identical captures taken on the same day share a file.
    pub fn save(&self, bytes: &[u8]) -> Result<PathBuf> {
        if bytes.len() != BLOCK_LEN {
            return Err(CodecError::length(BLOCK_LEN, bytes.len()).into());
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|err| file_error!("error creating {}: {}", self.dir.display(), err))?;

        let id = crc16::State::<crc16::MODBUS>::calculate(bytes);
        let name = format!("{}-{:04x}.bin", chrono::Local::now().format("%Y-%m-%d"), id);
        let path = self.dir.join(name);

        std::fs::write(&path, bytes).with_context(|| format!("error writing {}", path.display()))?;
        info!("Saved capture to {}", path.display());

        Ok(path)
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|err| file_error!("error reading {}: {}", path.display(), err))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    /// Captures in the store, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<_> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("error listing {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "bin"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}
