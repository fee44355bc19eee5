//! Visualization Hub Library
//!
//! Compiles a declarative hub configuration and a visualization catalog into
//! reverse-proxy rules for nginx or Apache httpd, plus the side files a
//! deployment needs: branch/host lookup maps, a names file, a navigation
//! snapshot and an OpenAPI document.
//!
//! The pipeline runs once per build:
//!
//! 1. [`services::ResolvedConfig`] loads the configuration and applies
//!    environment overrides and placeholder modes;
//! 2. [`services::CatalogBuilder`] filters and enriches the catalog;
//! 3. [`compiler::RenderContext`] assembles values and the
//!    [`helpers`] registry;
//! 4. [`compiler::RuleCompiler`] renders every template with that context;
//! 5. [`services::MapWriter`] writes the httpd lookup maps.
//!
//! [`compiler::Project::build`] runs all of it.

// Module declarations
pub mod cli;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod helpers;
pub mod models;
pub mod services;
pub mod template;
