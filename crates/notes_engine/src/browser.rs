use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::{AtomicFileWriter, PersistError};

/// The browsing environment around the page.
pub trait Browser: Send + Sync {
    /// Opens `url` in a separate browsing context. Never blocks on the result.
    fn open_popup(&self, url: &Url, name: &str, features: &str);
    /// Shows a user-visible notice.
    fn alert(&self, message: &str);
}

/// Save-as mechanism for downloaded artifacts.
pub trait SaveTarget: Send + Sync {
    /// Saves the artifact materialized at `artifact` under `filename`.
    fn save(&self, artifact: &Path, filename: &str) -> Result<PathBuf, PersistError>;
}

/// Saves artifacts into a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    writer: AtomicFileWriter,
}

impl DirectorySaveTarget {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, artifact: &Path, filename: &str) -> Result<PathBuf, PersistError> {
        let content = fs::read(artifact)?;
        self.writer.write(filename, &content)
    }
}
