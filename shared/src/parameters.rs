//! Parameter file persistence
//!
//! Baselines live as one JSON file per test case under a parameters
//! directory:
//!
//! ```text
//! <dir>/<case id>.json
//! ```
//!
//! Files are written pretty-printed with a 4-space indent and a trailing
//! newline so they diff cleanly under version control.

use crate::ParameterTree;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Default parameters directory, relative to the working directory
pub const DEFAULT_PARAMETERS_DIR: &str = "parameters";

/// Errors from reading or writing parameter files
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parameters file '{}' does not contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },
}

/// Reads and writes baseline parameter trees
#[derive(Debug, Clone)]
pub struct ParameterStore {
    dir: PathBuf,
}

impl ParameterStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the parameter file for a test case
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Create the parameters directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<(), ParameterError> {
        if !self.dir.exists() {
            info!("Creating parameters directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir).map_err(|source| ParameterError::Io {
                path: self.dir.clone(),
                source,
            })?;
            info!("Parameters directory created successfully");
        }
        Ok(())
    }

    /// Load a parameter tree, distinguishing "no file" from a broken file
    pub fn try_load(&self, name: &str) -> Result<Option<ParameterTree>, ParameterError> {
        let path = self.file_path(name);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| ParameterError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| {
            ParameterError::Json {
                path: path.clone(),
                source,
            }
        })?;

        match value {
            Value::Object(tree) => Ok(Some(tree)),
            _ => Err(ParameterError::NotAnObject { path }),
        }
    }

    /// Load a parameter tree.
    ///
    /// A missing file yields an empty tree. An unreadable or malformed file
    /// is logged and also yields an empty tree.
    pub fn load(&self, name: &str) -> ParameterTree {
        let path = self.file_path(name);
        info!("Loading parameters from file '{}'", path.display());

        match self.try_load(name) {
            Ok(Some(tree)) => {
                info!("Successfully loaded parameters from file '{}'", path.display());
                tree
            }
            Ok(None) => {
                warn!("Parameters file '{}' not found", path.display());
                ParameterTree::new()
            }
            Err(e) => {
                error!("Failed to load parameters file: {}", e);
                ParameterTree::new()
            }
        }
    }

    /// Write a parameter tree, replacing any existing file
    pub fn try_save(&self, name: &str, tree: &ParameterTree) -> Result<(), ParameterError> {
        let path = self.file_path(name);

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        tree.serialize(&mut serializer)
            .map_err(|source| ParameterError::Json {
                path: path.clone(),
                source,
            })?;
        buf.push(b'\n');

        let mut file = fs::File::create(&path).map_err(|source| ParameterError::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(&buf)
            .map_err(|source| ParameterError::Io { path, source })?;

        Ok(())
    }

    /// Write a parameter tree; `false` if it could not be written
    pub fn save(&self, name: &str, tree: &ParameterTree) -> bool {
        let path = self.file_path(name);
        info!("Saving test case parameters to file '{}'", path.display());

        match self.try_save(name, tree) {
            Ok(()) => {
                info!("Successfully saved parameters to file '{}'", path.display());
                true
            }
            Err(e) => {
                error!("Failed to write parameters: {}", e);
                false
            }
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(DEFAULT_PARAMETERS_DIR)
    }
}
