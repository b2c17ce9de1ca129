//! Effect - A single side effect against the remote platform
//!
//! Effects are values: building one does nothing until a host executes it.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Query a data source
    Read(Resource),
    Create(Resource),
    /// Replace a resource with its complete desired state
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete a resource; carries the last known state
    Delete(State),
}

impl Effect {
    /// Whether executing this Effect changes anything remotely
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Read(r) => write!(f, "read {}", r.id),
            Effect::Create(r) => write!(f, "create {}", r.id),
            Effect::Update {
                id,
                changed_attributes,
                ..
            } => write!(f, "update {} ({})", id, changed_attributes.join(", ")),
            Effect::Delete(state) => write!(f, "delete {}", state.id),
        }
    }
}
