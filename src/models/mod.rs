//! Data models for the hub configuration and the visualization catalog.
//!
//! Models are plain data with typed accessors; resolution, enrichment and
//! rendering live in the services, template and compiler modules.

pub mod configuration;
pub mod engine;
pub mod visualization;

// Re-export all model types
pub use configuration::{
    is_truthy, value_text, ConfigError, Configuration, HubOrganization, Mapping, RoutingTable,
};
pub use engine::{Environment, ProxyEngine, RoutingGroup};
pub use visualization::{
    Catalog, EnrichedCatalog, EnrichedGroup, EnrichedUnit, VisualizationGroup, VisualizationUnit,
};
