//! Read-only data source types

use std::sync::Arc;

use qlik_client::QlikApi;
use qlik_core::provider::ResourceType;

use crate::mapper::{DataSourceHandler, DataSourceMapper};

pub mod data_connections;
pub mod data_gateway;
pub mod source_entities;
pub mod space;
pub mod spaces;

pub use data_connections::DataConnectionsDataSource;
pub use data_gateway::DataGatewayDataSource;
pub use source_entities::SourceEntitiesDataSource;
pub use space::SpaceDataSource;
pub use spaces::SpacesDataSource;

/// Listings return at most this many items; there is no pagination.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(SpacesDataSource),
        Box::new(SpaceDataSource),
        Box::new(DataGatewayDataSource),
        Box::new(DataConnectionsDataSource),
        Box::new(SourceEntitiesDataSource),
    ]
}

pub fn data_source_handlers(api: &Arc<dyn QlikApi>) -> Vec<Box<dyn DataSourceHandler>> {
    vec![
        Box::new(DataSourceMapper::new(SpacesDataSource, api.clone())),
        Box::new(DataSourceMapper::new(SpaceDataSource, api.clone())),
        Box::new(DataSourceMapper::new(DataGatewayDataSource, api.clone())),
        Box::new(DataSourceMapper::new(DataConnectionsDataSource, api.clone())),
        Box::new(DataSourceMapper::new(SourceEntitiesDataSource, api.clone())),
    ]
}
