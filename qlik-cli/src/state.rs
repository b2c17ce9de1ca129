//! Local state file (`qlik.state.json`)
//!
//! Records every managed resource with the attributes last returned by the
//! provider, in the order the resources were created.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qlik_core::resource::{ResourceId, State, attributes_from_json, attributes_to_json};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid state file: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported state file version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    /// Incremented on every write
    pub serial: u64,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            resources: Vec::new(),
        }
    }

    pub fn find(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.matches(id))
    }

    /// Replace the entry for this resource, or append it
    pub fn upsert(&mut self, state: &State) {
        let entry = ResourceState::from_state(state);
        match self.resources.iter_mut().find(|r| r.matches(&state.id)) {
            Some(existing) => *existing = entry,
            None => self.resources.push(entry),
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self.resources.iter().position(|r| r.matches(id))?;
        Some(self.resources.remove(pos))
    }

    /// Ids in creation order
    pub fn ids(&self) -> Vec<ResourceId> {
        self.resources.iter().map(ResourceState::id).collect()
    }

    pub fn states(&self) -> HashMap<ResourceId, State> {
        self.resources
            .iter()
            .map(|r| (r.id(), r.to_state()))
            .collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Identifier assigned by Qlik Cloud
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceState {
    pub fn from_state(state: &State) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            identifier: state.identifier.clone(),
            attributes: attributes_to_json(&state.attributes),
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    fn matches(&self, id: &ResourceId) -> bool {
        self.resource_type == id.resource_type && self.name == id.name
    }

    pub fn to_state(&self) -> State {
        let state = State::existing(self.id(), attributes_from_json(&self.attributes));
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier.clone()),
            None => state,
        }
    }
}

/// State kept in a JSON file on the local disk
pub struct LocalState {
    path: PathBuf,
}

impl LocalState {
    pub const DEFAULT_STATE_FILE: &'static str = "qlik.state.json";

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored state, or `None` when nothing has been written yet
    pub fn read(&self) -> StateResult<Option<StateFile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StateError::Io(format!("Failed to read state file: {}", e)))?;
        let state: StateFile = serde_json::from_str(&content)
            .map_err(|e| StateError::InvalidState(format!("Failed to parse state file: {}", e)))?;

        if state.version != StateFile::CURRENT_VERSION {
            return Err(StateError::Version {
                found: state.version,
                expected: StateFile::CURRENT_VERSION,
            });
        }
        Ok(Some(state))
    }

    pub fn read_or_default(&self) -> StateResult<StateFile> {
        Ok(self.read()?.unwrap_or_default())
    }

    /// Bump the serial and write through a temporary file
    pub fn write(&self, state: &mut StateFile) -> StateResult<()> {
        state.serial += 1;
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::Serialization(format!("Failed to serialize state: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| StateError::Io(format!("Failed to write state file: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StateError::Io(format!("Failed to replace state file: {}", e)))?;

        log::debug!("Wrote state serial {} to {}", state.serial, self.path.display());
        Ok(())
    }
}
