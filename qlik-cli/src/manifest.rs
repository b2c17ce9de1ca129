//! Manifest - Desired resources read from a JSON file
//!
//! ```json
//! {
//!   "provider": { "tenant_id": "acme", "region": "eu" },
//!   "resources": [
//!     { "type": "qlik_space", "name": "main", "attributes": { "name": "Sales", "type": "shared" } },
//!     { "type": "qlik_data_project", "name": "lake",
//!       "attributes": { "space_id": "${qlik_space.main.id}" } }
//!   ],
//!   "data": [
//!     { "type": "qlik_data_gateway", "name": "gw", "attributes": { "id": "gw-1" } }
//!   ]
//! }
//! ```
//!
//! Entries under `data` are data source lookups; `qlik_space` may appear in both
//! lists, but a type and name pair is declared once across the manifest.
//!
//! A string value that is exactly `${type.name.attribute}` refers to an attribute
//! of another entry and is substituted once that entry is known.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use qlik_core::resource::{Attributes, Resource, ResourceId, Value, attributes_from_json};
use qlik_provider::ProviderSettings;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("{0} is declared more than once")]
    Duplicate(String),

    #[error("{from} refers to {to}, which is not declared")]
    UnknownReference { from: String, to: String },

    #[error("Circular reference involving {0}")]
    Cycle(String),

    #[error("{entry}: '{attribute}' must be a whole number")]
    Fractional { entry: String, attribute: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub resources: Vec<ManifestEntry>,
    #[serde(default)]
    pub data: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ManifestError::Parse { message, .. } => ManifestError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(content).map_err(|e| ManifestError::Parse {
            path: "manifest".to_string(),
            message: e.to_string(),
        })
    }

    /// Managed entries followed by data source lookups, as host resources
    pub fn to_resources(&self) -> Result<Vec<Resource>, ManifestError> {
        let mut seen = HashSet::new();
        let entries = self
            .resources
            .iter()
            .map(|entry| (entry, false))
            .chain(self.data.iter().map(|entry| (entry, true)));

        let mut resources = Vec::with_capacity(self.resources.len() + self.data.len());
        for (entry, read_only) in entries {
            let id = ResourceId::new(&entry.resource_type, &entry.name);
            if !seen.insert(id.clone()) {
                return Err(ManifestError::Duplicate(id.to_string()));
            }
            if let Some(attribute) = entry
                .attributes
                .iter()
                .find_map(|(name, value)| fractional_path(name, value))
            {
                return Err(ManifestError::Fractional {
                    entry: id.to_string(),
                    attribute,
                });
            }
            resources.push(Resource {
                id,
                attributes: attributes_from_json(&entry.attributes),
                read_only,
            });
        }
        Ok(resources)
    }
}

/// Path to the first number with a fractional part
fn fractional_path(path: &str, value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => n
            .as_f64()
            .filter(|f| f.fract() != 0.0)
            .map(|_| path.to_string()),
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| fractional_path(&format!("{}[{}]", path, i), item)),
        serde_json::Value::Object(fields) => fields
            .iter()
            .find_map(|(k, v)| fractional_path(&format!("{}.{}", path, k), v)),
        _ => None,
    }
}

/// `${type.name.attribute}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub resource_type: String,
    pub name: String,
    pub attribute: String,
}

impl Reference {
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s.strip_prefix("${")?.strip_suffix('}')?;
        let mut parts = inner.splitn(3, '.');
        let resource_type = parts.next()?;
        let name = parts.next()?;
        let attribute = parts.next()?;
        if [resource_type, name, attribute].iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            attribute: attribute.to_string(),
        })
    }

    pub fn target(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }
}

/// Known attributes of every resource, keyed by id
#[derive(Debug, Default)]
pub struct Bindings {
    values: HashMap<ResourceId, Attributes>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record attributes for a resource; later values win
    pub fn insert(&mut self, id: &ResourceId, attributes: &Attributes) {
        let entry = self.values.entry(id.clone()).or_default();
        for (k, v) in attributes {
            entry.insert(k.clone(), v.clone());
        }
    }

    fn lookup(&self, reference: &Reference) -> Option<&Value> {
        self.values
            .get(&reference.target())
            .and_then(|attrs| attrs.get(&reference.attribute))
    }

    pub fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => match Reference::parse(s) {
                Some(reference) => match self.lookup(&reference) {
                    Some(found) if found != value => self.resolve_value(found),
                    _ => value.clone(),
                },
                None => value.clone(),
            },
            Value::List(items) => {
                Value::List(items.iter().map(|v| self.resolve_value(v)).collect())
            }
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_value(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    pub fn resolve(&self, resource: &Resource) -> Resource {
        let mut resolved = resource.clone();
        resolved.attributes = resource
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), self.resolve_value(v)))
            .collect();
        resolved
    }
}

fn collect_references(value: &Value, refs: &mut Vec<Reference>) {
    match value {
        Value::String(s) => {
            if let Some(reference) = Reference::parse(s) {
                refs.push(reference);
            }
        }
        Value::List(items) => {
            for item in items {
                collect_references(item, refs);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_references(v, refs);
            }
        }
        _ => {}
    }
}

pub fn references(resource: &Resource) -> Vec<Reference> {
    let mut refs = Vec::new();
    for value in resource.attributes.values() {
        collect_references(value, &mut refs);
    }
    refs
}

/// First reference still present after resolution, if any
pub fn first_unresolved(resource: &Resource) -> Option<String> {
    references(resource).first().map(|r| {
        format!("${{{}.{}.{}}}", r.resource_type, r.name, r.attribute)
    })
}

/// Order resources so that every reference target comes before its referrer
///
/// Manifest order is kept wherever references allow it.
pub fn sort_by_dependencies(resources: &[Resource]) -> Result<Vec<Resource>, ManifestError> {
    let by_id: HashMap<&ResourceId, &Resource> = resources.iter().map(|r| (&r.id, r)).collect();

    fn visit<'a>(
        resource: &'a Resource,
        by_id: &HashMap<&ResourceId, &'a Resource>,
        visited: &mut HashSet<ResourceId>,
        visiting: &mut HashSet<ResourceId>,
        sorted: &mut Vec<Resource>,
    ) -> Result<(), ManifestError> {
        if visited.contains(&resource.id) {
            return Ok(());
        }
        if !visiting.insert(resource.id.clone()) {
            return Err(ManifestError::Cycle(resource.id.to_string()));
        }

        for reference in references(resource) {
            let target = reference.target();
            if target == resource.id {
                continue;
            }
            let dep = by_id
                .get(&target)
                .ok_or_else(|| ManifestError::UnknownReference {
                    from: resource.id.to_string(),
                    to: target.to_string(),
                })?;
            visit(dep, by_id, visited, visiting, sorted)?;
        }

        visiting.remove(&resource.id);
        visited.insert(resource.id.clone());
        sorted.push(resource.clone());
        Ok(())
    }

    let mut sorted = Vec::with_capacity(resources.len());
    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();
    for resource in resources {
        visit(resource, &by_id, &mut visited, &mut visiting, &mut sorted)?;
    }
    Ok(sorted)
}
