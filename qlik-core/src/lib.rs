//! Qlik Core
//!
//! Host boundary types shared by the Qlik Cloud provider and its hosts:
//! attribute values, schemas, diagnostics, and the Provider trait.

pub mod diagnostics;
pub mod differ;
pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
