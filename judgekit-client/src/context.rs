// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Project context
//!
//! The org and project a session works in are passed explicitly to every
//! call that needs them. [`ContextStore`] only remembers the last context
//! across restarts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("No configuration directory on this platform")]
    NoConfigDir,

    #[error("Context file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Context serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    pub project_id: String,
}

impl ProjectContext {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            org_id: None,
            project_id: project_id.into(),
        }
    }

    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }
}

/// JSON file holding the last used context
pub struct ContextStore {
    file_path: PathBuf,
}

impl ContextStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// `<config dir>/judgekit/context.json`
    pub fn default_location() -> Result<Self, ContextError> {
        let dir = dirs::config_dir().ok_or(ContextError::NoConfigDir)?;
        Ok(Self::new(dir.join("judgekit").join("context.json")))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Restore the saved context. A missing or unreadable file means no
    /// context.
    pub fn load(&self) -> Option<ProjectContext> {
        if !self.file_path.exists() {
            debug!("No saved context at {}", self.file_path.display());
            return None;
        }

        let parsed = std::fs::read_to_string(&self.file_path)
            .map_err(ContextError::from)
            .and_then(|contents| serde_json::from_str::<ProjectContext>(&contents).map_err(ContextError::from));

        match parsed {
            Ok(context) => {
                info!("Restored context for project {}", context.project_id);
                Some(context)
            }
            Err(e) => {
                warn!(
                    "Ignoring saved context at {}: {}",
                    self.file_path.display(),
                    e
                );
                None
            }
        }
    }

    pub fn save(&self, context: &ProjectContext) -> Result<(), ContextError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(context)?;

        let tmp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;
        debug!("Saved context to {}", self.file_path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ContextError> {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
