//! Copy Policy Configuration
//!
//! Defaults, then `<config_dir>/rusttapeimg/config.json`, then an explicit
//! `--config` file, then command line overrides.

use crate::error::{Result, TapeImageError};
use crate::image::writer::DEFAULT_END_OF_TAPE_MARKS;
use crate::image::MAX_RECORD_LEN;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Consecutive read errors written before guessing end of medium
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 20;

/// 640K ought to be enough for any tape record
pub const DEFAULT_RECORD_BUFFER_SIZE: usize = 640 * 1024;

const CONFIG_DIR_NAME: &str = "rusttapeimg";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CopyPolicy {
    pub max_consecutive_errors: u32,
    pub end_of_tape_marks: u32,
    pub record_buffer_size: usize,
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            end_of_tape_marks: DEFAULT_END_OF_TAPE_MARKS,
            record_buffer_size: DEFAULT_RECORD_BUFFER_SIZE,
        }
    }
}

/// Command line values that take precedence over any file
#[derive(Debug, Clone, Default)]
pub struct PolicyOverrides {
    pub max_consecutive_errors: Option<u32>,
    pub end_of_tape_marks: Option<u32>,
    pub record_buffer_size: Option<usize>,
}

impl CopyPolicy {
    /// Parse a JSON policy file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let policy: CopyPolicy = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(policy)
    }

    /// Default per-user config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Resolve the effective policy
    pub fn load(explicit: Option<&Path>, overrides: &PolicyOverrides) -> Result<Self> {
        let mut policy = match explicit {
            Some(path) => {
                debug!("Loading config file: {:?}", path);
                Self::from_file(path)?
            }
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!("Loading default config file: {:?}", path);
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        policy.apply(overrides);
        policy.validate()?;
        Ok(policy)
    }

    pub fn apply(&mut self, overrides: &PolicyOverrides) {
        if let Some(n) = overrides.max_consecutive_errors {
            self.max_consecutive_errors = n;
        }
        if let Some(n) = overrides.end_of_tape_marks {
            self.end_of_tape_marks = n;
        }
        if let Some(n) = overrides.record_buffer_size {
            self.record_buffer_size = n;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.record_buffer_size == 0 {
            return Err(TapeImageError::config("record_buffer_size must be at least 1"));
        }
        if self.record_buffer_size > MAX_RECORD_LEN {
            return Err(TapeImageError::config(format!(
                "record_buffer_size {} exceeds the largest image record ({})",
                self.record_buffer_size, MAX_RECORD_LEN
            )));
        }
        Ok(())
    }
}
