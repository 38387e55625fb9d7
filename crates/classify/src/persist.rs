//! Versioned on-disk schema for the rule table.
//!
//! ```toml
//! version = 1
//!
//! [[rules]]
//! category = "Groceries"
//! keywords = ["whole foods", "trader joe"]
//! ```

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{CategoryRule, RuleTable, TableError};

pub const RULES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Rule file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rule table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize rule table: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unsupported rule schema version {found} (expected {})", RULES_SCHEMA_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("Invalid rule table: {0}")]
    InvalidTable(#[from] TableError),
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleFile {
    version: u32,
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

impl RuleTable {
    pub fn to_toml(&self) -> Result<String, RulesError> {
        let file = RuleFile {
            version: RULES_SCHEMA_VERSION,
            rules: self.rules().to_vec(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, RulesError> {
        let file: RuleFile = toml::from_str(content)?;
        if file.version != RULES_SCHEMA_VERSION {
            return Err(RulesError::UnsupportedVersion { found: file.version });
        }
        Ok(RuleTable::new(file.rules)?)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), RulesError> {
        writer.write_all(self.to_toml()?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, RulesError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_toml(&content)
    }

    /// Writes to a uniquely named sibling temp file and renames it over
    /// `path`, so a reader never sees a half-written table and concurrent
    /// saves never share a temp file.
    pub fn save(&self, path: &Path) -> Result<(), RulesError> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let content = self.to_toml()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| RulesError::Io(e.error))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RulesError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_toml(&content)
    }
}
