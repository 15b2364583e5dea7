//! Template context for image rendering
//!
//! Exposes the requested name and version, the image being rendered and its
//! ancestor chain to the Tera templates embedded in image attributes.

use crate::types::Image;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tera::Context;

/// Source of the render timestamp
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Image attributes plus the nested ancestor chain
///
/// `parent` is left out for roots so that templates reaching past the top
/// of the chain fail instead of rendering empty strings.
#[derive(Debug, Serialize)]
pub struct ImageView<'a> {
    #[serde(flatten)]
    image: &'a Image,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<Box<ImageView<'a>>>,
}

impl<'a> ImageView<'a> {
    pub fn new(image: &'a Image) -> Self {
        Self {
            image,
            parent: image.parent().map(|p| Box::new(ImageView::new(p.as_ref()))),
        }
    }
}

/// Values available to image templates
///
/// | key | content |
/// |-----|---------|
/// | `name`, `version` | requested name and version |
/// | `image` | image being rendered, with `image.parent...` |
/// | `parent` | direct ancestor, with `parent.parent...` |
/// | `date_rfc3339`, `date_rfc3339_nano` | render timestamp |
#[derive(Debug, Serialize)]
pub struct RenderContext<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub image: ImageView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ImageView<'a>>,
    pub date_rfc3339: String,
    pub date_rfc3339_nano: String,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context
    pub fn new(name: &'a str, version: &'a str, image: &'a Image, now: DateTime<Utc>) -> Self {
        Self {
            name,
            version,
            image: ImageView::new(image),
            parent: image.parent().map(|p| ImageView::new(p.as_ref())),
            date_rfc3339: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            date_rfc3339_nano: now.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }

    /// Convert to Tera context for template rendering
    pub fn to_tera_context(&self) -> tera::Result<Context> {
        Context::from_serialize(self)
    }
}
