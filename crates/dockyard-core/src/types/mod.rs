//! Type definitions for the image model and plan settings

mod image;
mod plan;
mod reference;
mod value;

pub use image::{sort_images, Image, WILDCARD_VERSION};
pub use plan::PlanKind;
pub use reference::{
    normalized_name, ImageReference, DEFAULT_REGISTRY_HOST, DEFAULT_REGISTRY_NAMESPACE,
    DEFAULT_TAG,
};
pub use value::VarValue;
