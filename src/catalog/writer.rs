//! Output file writing

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const PRINTERS_FILE: &str = "printers.json";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders a value as pretty JSON with a trailing newline
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Renders `value` into `<path>.tmp` without touching `path` itself
///
/// [`StagedFile::commit`] renames it into place, so readers never see a
/// partial file. Staging every output before committing any of them keeps a
/// set of files consistent when one of them cannot be written.
pub fn stage_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<StagedFile, WriteError> {
    let rendered = render_json(value).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let staged = StagedFile {
        path: path.to_path_buf(),
        tmp_path: temp_path(path),
        bytes: rendered.len(),
        committed: false,
    };

    let result = (|| {
        let mut file = fs::File::create(&staged.tmp_path)?;
        file.write_all(rendered.as_bytes())?;
        file.sync_all()
    })();

    // Dropping `staged` on error removes the partial temp file
    result.map_err(io_err)?;
    Ok(staged)
}

/// A fully written temp file waiting to be renamed over its target
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    tmp_path: PathBuf,
    bytes: usize,
    committed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temp file into place
    pub fn commit(mut self) -> Result<(), WriteError> {
        fs::rename(&self.tmp_path, &self.path).map_err(|source| WriteError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.committed = true;
        info!(path = %self.path.display(), bytes = self.bytes, "Saved");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
