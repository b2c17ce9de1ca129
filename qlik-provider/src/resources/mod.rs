//! Manageable resource types

use std::sync::Arc;

use qlik_client::QlikApi;
use qlik_core::provider::ResourceType;

use crate::mapper::{ResourceHandler, ResourceMapper};

pub mod data_app;
pub mod data_app_source_selection;
pub mod data_connection;
pub mod data_project;
pub mod space;

pub use data_app::DataAppResource;
pub use data_app_source_selection::DataAppSourceSelectionResource;
pub use data_connection::DataConnectionResource;
pub use data_project::DataProjectResource;
pub use space::SpaceResource;

/// All resource types, in dependency order
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(SpaceResource),
        Box::new(DataConnectionResource),
        Box::new(DataProjectResource),
        Box::new(DataAppResource),
        Box::new(DataAppSourceSelectionResource),
    ]
}

/// One mapper per resource type, sharing the client handle
pub fn resource_handlers(api: &Arc<dyn QlikApi>) -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(ResourceMapper::new(SpaceResource, api.clone())),
        Box::new(ResourceMapper::new(DataConnectionResource, api.clone())),
        Box::new(ResourceMapper::new(DataProjectResource, api.clone())),
        Box::new(ResourceMapper::new(DataAppResource, api.clone())),
        Box::new(ResourceMapper::new(DataAppSourceSelectionResource, api.clone())),
    ]
}
