// Local store for the exported drawing: one PNG per fixed key in a directory.
// Visual: pressing SAVE leaves `<dir>/<key>.png` on disk; LOAD paints it back.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::Error;

/// Key the drawing is stored under unless configured otherwise.
pub const DEFAULT_KEY: &str = "elephant";

pub struct LocalStore {
    dir: PathBuf,
    key: String,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { dir: dir.into(), key: key.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.png", self.key))
    }

    /// Overwrite the stored PNG. Creates the directory if needed.
    pub fn save(&self, png: &[u8]) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Storage(format!("create {}: {e}", self.dir.display())))?;
        let path = self.path();
        fs::write(&path, png).map_err(|e| Error::Storage(format!("write {}: {e}", path.display())))?;
        info!(path = %path.display(), bytes = png.len(), "drawing saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<u8>, Error> {
        let path = self.path();
        fs::read(&path).map_err(|e| Error::Storage(format!("read {}: {e}", path.display())))
    }
}
