//! Cascade plan: an image and its descendants, children gated on parents

use crate::base::BasePlan;
use crate::step::{gate, Step};
use crate::traits::Planner;
use dockyard_catalog::ImageRepository;
use dockyard_core::error::{Result, ResultExt};
use dockyard_core::types::Image;
use std::sync::Arc;
use tracing::debug;

/// Plans the requested images and their descendants, down to `depth`
/// generations
///
/// Steps come out in pre-order. Every child step waits on a gate its
/// parent step signals, so the steps may all be dispatched at once.
#[derive(Debug, Clone)]
pub struct CascadePlan {
    base: BasePlan,
    depth: i32,
}

impl CascadePlan {
    /// A negative `depth` plans every generation
    pub fn new(images: Option<Arc<dyn ImageRepository>>, depth: i32) -> Self {
        Self {
            base: BasePlan::new(images),
            depth,
        }
    }

    /// Generations planned below each requested image
    pub fn depth(&self) -> i32 {
        self.depth
    }

    fn plan_image(
        &self,
        store: &dyn ImageRepository,
        image: Arc<Image>,
        parent: Option<usize>,
        depth: i32,
        steps: &mut Vec<Step>,
    ) {
        if depth == 0 || store.is_wildcard(&image) {
            return;
        }

        let wait_gate = parent.map(|index| {
            let (notifier, wait_gate) = gate();
            steps[index].subscribe(notifier);
            wait_gate
        });

        let children = image.children();
        let name = image.name.clone();
        steps.push(Step::new(image, name, wait_gate));
        let index = steps.len() - 1;

        for child in children {
            self.plan_image(store, child, Some(index), depth.saturating_sub(1), steps);
        }
    }
}

impl Planner for CascadePlan {
    fn plan(&self, name: &str, versions: &[String]) -> Result<Vec<Step>> {
        let context = "plan::cascade";
        let images = self.base.find_images(name, versions).context(context)?;
        let store = self.base.images().context(context)?;

        let mut steps = Vec::new();
        for image in images {
            self.plan_image(store.as_ref(), image, None, self.depth, &mut steps);
        }

        debug!(
            "Planned {} step(s) for '{}' with depth {}",
            steps.len(),
            name,
            self.depth
        );
        Ok(steps)
    }
}
