//! Template rendering for image definitions
//!
//! Image attributes may embed Tera expressions referring to the requested
//! name and version and to any ancestor, e.g.
//! `version: "{{ version }}-{{ parent.version }}"`. Rendering serializes the
//! attributes to YAML, renders that text as a template and reads the
//! result back into a new image.

mod context;

pub use context::{Clock, FixedClock, ImageView, RenderContext, SystemClock};

use crate::error::{Error, Result};
use crate::types::Image;
use std::sync::Arc;
use tera::Tera;
use tracing::debug;

/// Produces concrete images out of templated ones
pub trait Renderer: Send + Sync {
    /// Render `image` for the requested `name` and `version`
    ///
    /// Returns a new image; `image` is left untouched. The rendered image
    /// keeps the parent and children links of the source.
    fn render(&self, name: &str, version: &str, image: &Image) -> Result<Image>;
}

/// Tera based renderer
#[derive(Clone)]
pub struct ImageRender {
    clock: Arc<dyn Clock>,
}

impl Default for ImageRender {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRender {
    /// Create a renderer stamping renders with the wall clock
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a renderer with a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Renderer for ImageRender {
    fn render(&self, name: &str, version: &str, image: &Image) -> Result<Image> {
        let id = format!("{}:{}", name, version);
        debug!("Rendering image {}", id);

        let template = image.to_yaml().map_err(|e| Error::render(&id, e))?;
        let context = RenderContext::new(name, version, image, self.clock.now())
            .to_tera_context()
            .map_err(|e| Error::render(&id, e))?;
        let rendered = Tera::one_off(&template, &context, false).map_err(|e| {
            debug!("Failed template for image {}:\n{}", id, template);
            Error::render(&id, e)
        })?;

        let mut rendered_image = Image::from_yaml(&rendered).map_err(|e| Error::render(&id, e))?;
        rendered_image.set_parent(image.parent().cloned());
        for child in image.children() {
            rendered_image.add_child(&child);
        }

        Ok(rendered_image)
    }
}
