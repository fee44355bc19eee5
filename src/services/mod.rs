//! Service layer: loading, resolving and writing the build's inputs and
//! side outputs.

pub mod branch_maps;
pub mod catalog;
pub mod messages;
pub mod openapi;
pub mod resolver;
pub mod snapshot;

pub use branch_maps::{collect_maps, MapFile, MapWriter};
pub use catalog::{icon_markup, CatalogBuilder};
pub use messages::Messages;
pub use openapi::{api_context, example_file, prediction_paths, write_openapi};
pub use resolver::{apply_environment, resolve_urls, PlaceholderMode, ResolvedConfig};
pub use snapshot::{snapshot, write_snapshot};
