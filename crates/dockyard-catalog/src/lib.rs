//! Image catalog for Dockyard
//!
//! This crate provides:
//! - [`Catalog`], the indexed store of image definitions, with exact and
//!   wildcard lookups and recursive wildcard resolution
//! - [`ImageRepository`], the read interface planners consume
//! - [`CatalogLoader`], which reads image definition files and stores them
//!   parents first, wiring the parent/child tree

pub mod definitions;
pub mod loader;
pub mod store;

pub use definitions::{ImageDefinition, ImagesFile};
pub use loader::CatalogLoader;
pub use store::{Catalog, ImageRepository};
