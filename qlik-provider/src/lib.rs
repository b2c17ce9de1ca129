//! Qlik Cloud Provider
//!
//! Exposes Qlik Cloud spaces, data connections, data integration projects and
//! apps as managed resources, plus read-only lookups.
//!
//! ## Module Structure
//!
//! - `config` - Provider settings and environment fallback
//! - `connection_string` - Connector property lists for data connections
//! - `mapper` - Generic resource and data source mappers
//! - `resources` - Per-resource descriptors
//! - `data_sources` - Per-data-source descriptors
//! - `provider` - QlikProvider, the registry implementing `Provider`

pub mod config;
pub mod connection_string;
pub mod data_sources;
pub mod mapper;
pub mod provider;
pub mod resources;

#[cfg(test)]
mod fake;

pub use config::{EnvLookup, ProcessEnv, ProviderConfig, ProviderSettings, resolve_config};
pub use mapper::MapperError;
pub use provider::QlikProvider;
