//! In-memory output tree.
//!
//! Every target is rendered before anything touches the disk; `flush` then
//! replaces the output directory in one go, so a failing run leaves the
//! previous output untouched. A directory holding the working directory or
//! any of the input files is never removed.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ApogeeError, Result};

#[derive(Debug, Default)]
pub struct OutputTree {
    files: BTreeMap<PathBuf, String>,
}

impl OutputTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `path`, relative to the output directory
    pub fn add(&mut self, path: impl Into<PathBuf>, content: String) -> Result<()> {
        let path = path.into();
        if self.files.contains_key(&path) {
            return Err(ApogeeError::DuplicateOutput(path));
        }
        debug!(path = %path.display(), bytes = content.len(), "Buffered output file");
        self.files.insert(path, content);
        Ok(())
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove `out_dir` and write the whole tree below it. `inputs` are
    /// paths that must survive the removal.
    pub fn flush(&self, out_dir: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if out_dir.exists() {
            check_removable(out_dir, inputs)?;
            fs::remove_dir_all(out_dir).map_err(|e| ApogeeError::write_failed(out_dir, e))?;
        }
        fs::create_dir_all(out_dir).map_err(|e| ApogeeError::write_failed(out_dir, e))?;

        let mut written = Vec::with_capacity(self.files.len());
        for (relative, content) in &self.files {
            let path = out_dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ApogeeError::write_failed(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| ApogeeError::write_failed(&path, e))?;
            written.push(path);
        }

        info!(dir = %out_dir.display(), files = written.len(), "Wrote output tree");
        Ok(written)
    }
}

fn check_removable(out_dir: &Path, inputs: &[PathBuf]) -> Result<()> {
    let out = out_dir
        .canonicalize()
        .map_err(|e| ApogeeError::read_failed(out_dir, e))?;
    let cwd = env::current_dir().and_then(|d| d.canonicalize()).ok();

    let protected = inputs
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .chain(cwd);
    for path in protected {
        if path.starts_with(&out) {
            return Err(ApogeeError::UnsafeOutputDir {
                path: out_dir.to_path_buf(),
                contains: path,
            });
        }
    }
    Ok(())
}
