//! Flat plan: one independent step per image

use crate::base::BasePlan;
use crate::step::Step;
use crate::traits::Planner;
use dockyard_catalog::ImageRepository;
use dockyard_core::error::{Result, ResultExt};
use std::sync::Arc;

/// Plans only the requested images, with no ordering between them
#[derive(Debug, Clone, Default)]
pub struct SinglePlan {
    base: BasePlan,
}

impl SinglePlan {
    pub fn new(images: Option<Arc<dyn ImageRepository>>) -> Self {
        Self {
            base: BasePlan::new(images),
        }
    }
}

impl Planner for SinglePlan {
    fn plan(&self, name: &str, versions: &[String]) -> Result<Vec<Step>> {
        let images = self.base.find_images(name, versions).context("plan::single")?;

        Ok(images
            .into_iter()
            .map(|image| {
                let step_name = image.name.clone();
                Step::new(image, step_name, None)
            })
            .collect())
    }
}
