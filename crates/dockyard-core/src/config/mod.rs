//! Configuration loading and management

mod loader;

pub use loader::{DockyardConfig, PlanSettings, RegistryDefaults};
