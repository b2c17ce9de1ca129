//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared by the host with the "current state"
//! refreshed through the Provider, and generates the Effects needed (Plan).

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Attributes, Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
///
/// With a schema, configurable attributes dropped from the desired side also
/// count as changed, unless the recorded value is the attribute's default.
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let mut changed = find_changed_attributes(&desired.attributes, &current.attributes);
    if let Some(schema) = schema {
        changed.extend(find_removed_attributes(
            schema,
            &desired.attributes,
            &current.attributes,
        ));
        changed.sort();
    }

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Attributes the desired side sets whose value differs from the current state
fn find_changed_attributes(desired: &Attributes, current: &Attributes) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, desired_value)| current.get(*key) != Some(*desired_value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}

fn find_removed_attributes(
    schema: &ResourceSchema,
    desired: &Attributes,
    current: &Attributes,
) -> Vec<String> {
    schema
        .attributes
        .values()
        .filter(|attr| attr.is_configurable() && !desired.contains_key(&attr.name))
        .filter(|attr| {
            current
                .get(&attr.name)
                .is_some_and(|value| attr.default.as_ref() != Some(value))
        })
        .map(|attr| attr.name.clone())
        .collect()
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Resources in `current_states` that are no longer desired are deleted,
/// in the reverse of `state_order` so dependents go first. `schemas` holds
/// managed resource schemas keyed by type name.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    state_order: &[ResourceId],
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let schema = schemas.get(&resource.id.resource_type);
        match diff(resource, &current, schema) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Update {
                id,
                from,
                to,
                changed_attributes,
            }),
            Diff::NoChange(_) => {}
        }
    }

    let wanted: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    for id in state_order.iter().rev() {
        if wanted.contains(id) {
            continue;
        }
        if let Some(state) = current_states.get(id)
            && state.exists
        {
            plan.add(Effect::Delete(state.clone()));
        }
    }

    plan
}

/// Plan that deletes every existing resource, last created first
pub fn destroy_plan(
    current_states: &HashMap<ResourceId, State>,
    state_order: &[ResourceId],
) -> Plan {
    create_plan(&[], current_states, state_order, &HashMap::new())
}
