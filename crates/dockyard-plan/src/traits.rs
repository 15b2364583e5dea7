//! Planner trait definitions

use crate::step::Step;
use dockyard_core::error::Result;

/// Turns an image name and versions into build steps
pub trait Planner: Send + Sync {
    /// Plan the build of `name` at `versions`, every stored version when
    /// `versions` is empty
    ///
    /// Fails as a whole on the first image that cannot be resolved.
    fn plan(&self, name: &str, versions: &[String]) -> Result<Vec<Step>>;
}
