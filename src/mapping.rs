// SPDX-License-Identifier: MIT
//! De-obfuscation mapping tables and mapping source resolution

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Archive/directory entry holding the method name mapping
pub const METHODS_CSV: &str = "methods.csv";

/// Archive/directory entry holding the field name mapping
pub const FIELDS_CSV: &str = "fields.csv";

/// Errors that can occur while loading mappings
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read mapping archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Mapping archive is missing required entry '{0}'")]
    MissingEntry(&'static str),

    #[error("Malformed mapping line {line} in {path}: expected at least two comma-separated fields")]
    MalformedLine { path: PathBuf, line: usize },
}

/// Immutable obfuscated-name to original-name dictionary
///
/// Built once from a CSV source and only read afterwards. Each CSV line is
/// split into at most three parts, so commas in the third field (signatures,
/// comments) never break parsing of the first two. A duplicate key keeps the
/// last line's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<String, String>,
}

impl MappingTable {
    /// Load a table from a two/three-column CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self, MappingError> {
        let file = File::open(path)?;
        let mut entries = HashMap::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let mut parts = line.splitn(3, ',');
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => (key, value),
                _ => {
                    return Err(MappingError::MalformedLine {
                        path: path.to_path_buf(),
                        line: index + 1,
                    })
                }
            };
            entries.insert(key.to_string(), value.to_string());
        }

        info!("Loaded {} mappings from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    /// Build a table from in-memory entries
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up the replacement for an identifier
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Replace-if-present lookup: the mapped name, or the input unchanged
    pub fn remap<'a>(&'a self, value: &'a str) -> &'a str {
        self.get(value).unwrap_or(value)
    }

    /// Number of entries loaded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two mapping tables a remapping run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSet {
    /// Obfuscated method name mapping
    pub methods: MappingTable,

    /// Obfuscated field name mapping
    pub fields: MappingTable,
}

impl MappingSet {
    /// Load both tables from a directory containing `methods.csv` and
    /// `fields.csv`
    pub fn from_dir(dir: &Path) -> Result<Self, MappingError> {
        Ok(Self {
            methods: MappingTable::from_csv_path(&dir.join(METHODS_CSV))?,
            fields: MappingTable::from_csv_path(&dir.join(FIELDS_CSV))?,
        })
    }
}

/// Resolve a mapping source location into its two tables
///
/// A directory is read in place. A regular file is treated as a zip archive;
/// its two required entries are extracted into a process-scoped temporary
/// directory that is removed again on every exit path, success and error
/// alike.
pub fn load_mappings(location: &Path) -> Result<MappingSet, MappingError> {
    if location.is_file() {
        let staging = tempfile::tempdir()?;
        debug!(
            "Extracting mapping archive {} to {}",
            location.display(),
            staging.path().display()
        );
        extract_entries(location, staging.path())?;
        MappingSet::from_dir(staging.path())
        // staging dropped here, deleting the extracted files
    } else {
        MappingSet::from_dir(location)
    }
}

fn extract_entries(archive_path: &Path, target: &Path) -> Result<(), MappingError> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    for name in [METHODS_CSV, FIELDS_CSV] {
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(MappingError::MissingEntry(name))
            }
            Err(e) => return Err(MappingError::Archive(e)),
        };
        let mut out = File::create(target.join(name))?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}
