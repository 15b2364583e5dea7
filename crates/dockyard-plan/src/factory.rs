//! Planner selection

use crate::cascade::CascadePlan;
use crate::single::SinglePlan;
use crate::traits::Planner;
use dockyard_catalog::ImageRepository;
use dockyard_core::config::PlanSettings;
use dockyard_core::error::{Error, Result};
use dockyard_core::types::PlanKind;
use std::sync::Arc;
use tracing::debug;

/// Depth used when settings leave it out
pub const UNLIMITED_DEPTH: i32 = -1;

/// Inputs a planner may require
#[derive(Clone, Default)]
pub struct PlanParameters {
    /// Store images are looked up in
    pub store: Option<Arc<dyn ImageRepository>>,
    /// Generations a cascade plan descends
    pub depth: Option<i32>,
}

impl PlanParameters {
    /// Empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the images store
    pub fn with_store(mut self, store: Arc<dyn ImageRepository>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the cascade depth, negative for every generation
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Parameters from settings, a missing depth meaning every generation
    pub fn from_settings(settings: &PlanSettings, store: Arc<dyn ImageRepository>) -> Self {
        Self::new()
            .with_store(store)
            .with_depth(settings.depth.unwrap_or(UNLIMITED_DEPTH))
    }
}

impl std::fmt::Debug for PlanParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanParameters")
            .field("has_store", &self.store.is_some())
            .field("depth", &self.depth)
            .finish()
    }
}

/// Builds planners over one images store
#[derive(Clone)]
pub struct PlanFactory {
    store: Arc<dyn ImageRepository>,
}

impl PlanFactory {
    /// Factory handing `store` to every planner it builds
    pub fn new(store: Arc<dyn ImageRepository>) -> Self {
        Self { store }
    }

    /// Create the planner for `kind`
    ///
    /// Every planner requires a store; cascade plans also require a depth.
    pub fn new_plan(kind: PlanKind, parameters: &PlanParameters) -> Result<Box<dyn Planner>> {
        let context = "plan::factory";
        let store = parameters
            .store
            .clone()
            .ok_or_else(|| Error::missing_parameter(kind.id(), "store").context(context))?;

        debug!("Creating {} plan", kind);
        match kind {
            PlanKind::Cascade => {
                let depth = parameters
                    .depth
                    .ok_or_else(|| Error::missing_parameter(kind.id(), "depth").context(context))?;
                Ok(Box::new(CascadePlan::new(Some(store), depth)))
            }
            PlanKind::Single => Ok(Box::new(SinglePlan::new(Some(store)))),
        }
    }

    /// Create a planner by identifier, `cascade` or `single`
    pub fn plan_for(&self, id: &str, depth: Option<i32>) -> Result<Box<dyn Planner>> {
        let kind: PlanKind = id.parse()?;
        let parameters = PlanParameters {
            store: Some(self.store.clone()),
            depth,
        };
        Self::new_plan(kind, &parameters)
    }

    /// Create the planner described by `settings`
    pub fn plan_from_settings(&self, settings: &PlanSettings) -> Result<Box<dyn Planner>> {
        Self::new_plan(
            settings.kind,
            &PlanParameters::from_settings(settings, self.store.clone()),
        )
    }
}
