//! Build planning for Dockyard
//!
//! This crate provides:
//! - [`Step`], a unit of build work gated on its parent's completion
//! - [`SinglePlan`] and [`CascadePlan`], which resolve images through an
//!   [`ImageRepository`](dockyard_catalog::ImageRepository) and emit steps
//! - [`PlanFactory`], which selects a planner by [`PlanKind`](dockyard_core::PlanKind)
//!   or identifier
//!
//! Planning is synchronous. Executing the steps is left to the caller, which
//! is expected to dispatch every step at once and have each one `wait` on
//! its gate before building and `notify` its subscribers afterwards.

pub mod base;
pub mod cascade;
pub mod factory;
pub mod single;
pub mod step;
pub mod traits;

pub use base::BasePlan;
pub use cascade::CascadePlan;
pub use factory::{PlanFactory, PlanParameters, UNLIMITED_DEPTH};
pub use single::SinglePlan;
pub use step::{gate, Notifier, Step, WaitGate};
pub use traits::Planner;
