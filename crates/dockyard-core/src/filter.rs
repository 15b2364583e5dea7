//! Image selection by attribute

use crate::error::{Error, Result};
use crate::types::Image;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Image attribute a filter matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAttribute {
    Name,
    Version,
    RegistryHost,
    RegistryNamespace,
}

impl FilterAttribute {
    /// Short attribute name, as accepted by `FromStr`
    pub fn id(&self) -> &'static str {
        match self {
            FilterAttribute::Name => "name",
            FilterAttribute::Version => "version",
            FilterAttribute::RegistryHost => "registry",
            FilterAttribute::RegistryNamespace => "namespace",
        }
    }
}

impl fmt::Display for FilterAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for FilterAttribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(FilterAttribute::Name),
            "version" => Ok(FilterAttribute::Version),
            "registry" => Ok(FilterAttribute::RegistryHost),
            "namespace" => Ok(FilterAttribute::RegistryNamespace),
            other => Err(Error::invalid_config(format!(
                "Unknown filter attribute '{}'. Valid attributes: name, version, registry, namespace",
                other
            ))),
        }
    }
}

/// Exact-match filter on one image attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilter {
    pub attribute: FilterAttribute,
    pub value: String,
}

impl ImageFilter {
    /// Create a filter matching `value` on `attribute`
    pub fn new(attribute: FilterAttribute, value: impl Into<String>) -> Self {
        Self {
            attribute,
            value: value.into(),
        }
    }

    /// Whether `image` matches this filter
    pub fn matches(&self, image: &Image) -> bool {
        let field = match self.attribute {
            FilterAttribute::Name => &image.name,
            FilterAttribute::Version => &image.version,
            FilterAttribute::RegistryHost => &image.registry_host,
            FilterAttribute::RegistryNamespace => &image.registry_namespace,
        };
        field == &self.value
    }

    /// Images matching this filter, in input order
    pub fn select(&self, images: &[Arc<Image>]) -> Vec<Arc<Image>> {
        images
            .iter()
            .filter(|image| self.matches(image))
            .cloned()
            .collect()
    }
}

/// Images matching every filter, in input order
pub fn select_all(images: &[Arc<Image>], filters: &[ImageFilter]) -> Vec<Arc<Image>> {
    images
        .iter()
        .filter(|image| filters.iter().all(|f| f.matches(image)))
        .cloned()
        .collect()
}
