//! # dockyard-core
//!
//! Core library for Dockyard providing:
//! - The image entity and its parent/child links
//! - Tera based rendering of templated image definitions
//! - Image filters and reference normalization
//! - Settings loading (dockyard.yaml)
//! - The error type shared by the catalog and the planners

pub mod config;
pub mod error;
pub mod filter;
pub mod render;
pub mod types;

pub use config::{DockyardConfig, PlanSettings, RegistryDefaults};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use filter::{FilterAttribute, ImageFilter};
pub use render::{ImageRender, Renderer};
pub use types::{Image, ImageReference, PlanKind, VarValue, WILDCARD_VERSION};
