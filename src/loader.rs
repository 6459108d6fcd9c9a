//! This module provides the `AutomatonLoader` struct, responsible for loading automaton
//! definitions from files and strings in either the `.fa` text format or JSON.

use crate::parser::parse;
use crate::types::{AutomatonDefinition, AutomatonError};
use crate::validator::validate;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions picked up by [`AutomatonLoader::load_all`].
const EXTENSIONS: [&str; 2] = ["fa", "json"];

/// `AutomatonLoader` is a utility struct for loading automaton definitions.
/// Files ending in `.json` are decoded as wire-format JSON; anything else is parsed as `.fa` text.
pub struct AutomatonLoader;

impl AutomatonLoader {
    /// Loads a single automaton definition from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the `.fa` or `.json` file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(AutomatonDefinition)` if the file is read, decoded and valid.
    /// * `Err(AutomatonError::File)` if the file cannot be read.
    /// * `Err(AutomatonError::Parse)` or `Err(AutomatonError::Request)` if the content cannot be
    ///   decoded.
    /// * `Err(AutomatonError::Malformed)` if the definition fails validation.
    pub fn load(path: &Path) -> Result<AutomatonDefinition, AutomatonError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AutomatonError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::load_from_json(&content)
        } else {
            Self::load_from_string(&content)
        }
    }

    /// Loads a single automaton definition from `.fa` text.
    pub fn load_from_string(content: &str) -> Result<AutomatonDefinition, AutomatonError> {
        parse(content)
    }

    /// Loads a single automaton definition from wire-format JSON.
    pub fn load_from_json(content: &str) -> Result<AutomatonDefinition, AutomatonError> {
        let definition: AutomatonDefinition = serde_json::from_str(content)
            .map_err(|e| AutomatonError::Request(e.to_string()))?;

        validate(&definition)?;

        Ok(definition)
    }

    /// Loads every `.fa` and `.json` file directly inside a directory.
    ///
    /// Subdirectories and files with other extensions are skipped. Results are sorted by path.
    ///
    /// # Arguments
    ///
    /// * `directory` - A reference to the `Path` of the directory to scan.
    ///
    /// # Returns
    ///
    /// One `Result` per candidate file: its path and definition, or the error that prevented
    /// loading it.
    pub fn load_all(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, AutomatonDefinition), AutomatonError>> {
        if !directory.exists() {
            return vec![Err(AutomatonError::File(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(AutomatonError::File(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(AutomatonError::File(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }
        paths.sort();

        results.extend(
            paths
                .into_iter()
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext == *e))
                })
                .map(|path| match Self::load(&path) {
                    Ok(definition) => Ok((path, definition)),
                    Err(e) => Err(AutomatonError::File(format!(
                        "Failed to load automaton from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }
}
