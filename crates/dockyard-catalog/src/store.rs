//! Indexed image store
//!
//! Concrete images are indexed by name and rendered version. Wildcard
//! templates (version `*`) live in a separate index, at most one per name,
//! and are rendered on demand for any version requested of that name.
//! Exact entries always win over wildcard rendering.

use dockyard_core::error::{Error, Result, ResultExt};
use dockyard_core::filter::{self, ImageFilter};
use dockyard_core::render::Renderer;
use dockyard_core::types::{sort_images, Image, WILDCARD_VERSION};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Read access to stored images, as consumed by planners
pub trait ImageRepository: Send + Sync {
    /// All concrete images stored under `name`, sorted by version
    fn find_by_name(&self, name: &str) -> Result<Vec<Arc<Image>>>;

    /// Image stored under `name` and `version`, `None` on a miss
    fn find(&self, name: &str, version: &str) -> Result<Option<Arc<Image>>>;

    /// Like `find`, rendering the wildcard template for `find_name` as
    /// `image_name:image_version` when there is no concrete entry
    fn find_guaranteed(
        &self,
        find_name: &str,
        find_version: &str,
        image_name: &str,
        image_version: &str,
    ) -> Result<Arc<Image>>;

    /// Whether `image` is a wildcard template
    fn is_wildcard(&self, image: &Image) -> bool {
        image.is_wildcard()
    }
}

#[derive(Default)]
struct Indices {
    /// name -> rendered version -> image
    exact: HashMap<String, HashMap<String, Arc<Image>>>,
    /// name -> definition version -> rendered versions
    definitions: HashMap<String, HashMap<String, BTreeSet<String>>>,
    /// name -> tag -> rendered version
    tags: HashMap<String, HashMap<String, String>>,
    /// name -> wildcard template
    wildcards: HashMap<String, Arc<Image>>,
    /// every concrete image, in storage order
    images: Vec<Arc<Image>>,
}

/// Image catalog
///
/// Owns every stored image. Population (`store`) and querying are expected
/// to happen in separate phases, though both are safe to call through a
/// shared reference.
#[derive(Default)]
pub struct Catalog {
    renderer: Option<Arc<dyn Renderer>>,
    indices: RwLock<Indices>,
}

impl Catalog {
    /// Create a catalog that renders images with `renderer` as they are stored
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer: Some(renderer),
            indices: RwLock::new(Indices::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Indices> {
        self.indices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indices> {
        self.indices.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn renderer(&self) -> Result<&Arc<dyn Renderer>> {
        self.renderer.as_ref().ok_or(Error::RendererRequired)
    }

    /// Add an image to the catalog
    ///
    /// Wildcard templates are kept as defined. Any other image is rendered
    /// for `name` and `version` and indexed under `name` and its rendered
    /// version, tags and definition `version`. Storing a key twice fails and
    /// keeps the first image.
    pub fn store(&self, name: &str, version: &str, image: Image) -> Result<Arc<Image>> {
        let context = "catalog::store";

        if name.is_empty() {
            return Err(Error::invalid_image("To add an image to the store a name is required")
                .context(context));
        }
        if version.is_empty() {
            return Err(
                Error::invalid_image("To add an image to the store a version is required")
                    .context(context),
            );
        }
        let renderer = self.renderer().context(context)?;

        if version == WILDCARD_VERSION {
            return self.store_wildcard(name, image).context(context);
        }

        let mut rendered = renderer.render(name, version, &image).context(context)?;
        rendered.sanitize();
        rendered.normalize().context(context)?;

        let mut indices = self.write();
        let rendered_version = rendered.version.clone();

        if indices
            .exact
            .get(name)
            .is_some_and(|versions| versions.contains_key(&rendered_version))
        {
            return Err(Error::duplicate_image(name, &rendered_version).context(context));
        }

        let image = Arc::new(rendered);
        indices
            .exact
            .entry(name.to_string())
            .or_default()
            .insert(rendered_version.clone(), image.clone());
        indices
            .definitions
            .entry(name.to_string())
            .or_default()
            .entry(version.to_string())
            .or_default()
            .insert(rendered_version.clone());

        let aliases = indices.tags.entry(name.to_string()).or_default();
        for tag in image.tags.iter().filter(|t| **t != rendered_version) {
            if let Some(previous) = aliases.insert(tag.clone(), rendered_version.clone()) {
                if previous != rendered_version {
                    warn!(
                        "Tag '{}' of image '{}' moved from version '{}' to '{}'",
                        tag, name, previous, rendered_version
                    );
                }
            }
        }

        indices.images.push(image.clone());
        debug!("Stored image {} as {}:{}", image, name, rendered_version);

        Ok(image)
    }

    fn store_wildcard(&self, name: &str, image: Image) -> Result<Arc<Image>> {
        let mut indices = self.write();
        if indices.wildcards.contains_key(name) {
            return Err(Error::duplicate_wildcard(name));
        }

        let image = Arc::new(image);
        indices.wildcards.insert(name.to_string(), image.clone());
        debug!("Stored wildcard image {}", name);

        Ok(image)
    }

    /// Every concrete image, sorted by name and version
    pub fn list(&self) -> Vec<Arc<Image>> {
        let mut images = self.read().images.clone();
        sort_images(&mut images);
        images
    }

    /// Every concrete image under `name`, sorted by version
    pub fn find_by_name(&self, name: &str) -> Vec<Arc<Image>> {
        let mut images: Vec<Arc<Image>> = self
            .read()
            .exact
            .get(name)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default();
        sort_images(&mut images);
        images
    }

    /// Image under `name` and `version`
    ///
    /// Version `*` returns the wildcard template. Otherwise the rendered
    /// version is tried first, then the version the image was defined with,
    /// then its tags.
    pub fn find(&self, name: &str, version: &str) -> Option<Arc<Image>> {
        let indices = self.read();

        if version == WILDCARD_VERSION {
            return indices.wildcards.get(name).cloned();
        }

        let versions = indices.exact.get(name)?;
        if let Some(image) = versions.get(version) {
            return Some(image.clone());
        }

        let by_definition = indices
            .definitions
            .get(name)
            .and_then(|defs| defs.get(version))
            .and_then(|rendered| rendered.iter().next());
        let by_tag = indices.tags.get(name).and_then(|tags| tags.get(version));

        by_definition
            .or(by_tag)
            .and_then(|rendered| versions.get(rendered))
            .cloned()
    }

    /// Image under `find_name`/`find_version`, generating it from the
    /// wildcard template of `find_name` as `image_name:image_version` when
    /// no concrete image exists
    pub fn find_guaranteed(
        &self,
        find_name: &str,
        find_version: &str,
        image_name: &str,
        image_version: &str,
    ) -> Result<Arc<Image>> {
        let context = "catalog::find_guaranteed";

        let template = if find_version == WILDCARD_VERSION {
            self.find_wildcard_image(find_name)
        } else {
            match self.find(find_name, find_version) {
                Some(image) => return Ok(image),
                None => self.find_wildcard_image(find_name),
            }
        }
        .ok_or_else(|| Error::image_not_found(find_name, find_version).context(context))?;

        self.generate_image_from_wildcard(&template, image_name, image_version)
            .context(context)
    }

    /// Raw wildcard template for `name`
    pub fn find_wildcard_image(&self, name: &str) -> Option<Arc<Image>> {
        self.read().wildcards.get(name).cloned()
    }

    /// Whether `image` is a wildcard template: either versioned `*` or the
    /// very template stored in the wildcard index for its name
    pub fn is_wildcard(&self, image: &Image) -> bool {
        image.is_wildcard()
            || self
                .read()
                .wildcards
                .get(&image.name)
                .is_some_and(|template| std::ptr::eq(template.as_ref(), image))
    }

    /// Render a wildcard template as `name:version`
    ///
    /// Wildcard ancestors are generated first, oldest first, so every
    /// template is rendered against a concrete parent. Nothing is cached:
    /// each call renders the whole chain again.
    pub fn generate_image_from_wildcard(
        &self,
        wildcard: &Image,
        name: &str,
        version: &str,
    ) -> Result<Arc<Image>> {
        let mut chain = Vec::new();
        self.generate(wildcard, name, version, &mut chain)
            .context("catalog::generate_image_from_wildcard")
    }

    fn generate(
        &self,
        wildcard: &Image,
        name: &str,
        version: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<Image>> {
        let renderer = self.renderer()?;
        chain.push(wildcard.name.clone());

        let mut to_render = wildcard.clone();
        if let Some(parent) = wildcard.parent().filter(|p| self.is_wildcard(p)) {
            if chain.contains(&parent.name) {
                chain.push(parent.name.clone());
                return Err(Error::circular_dependency(chain.join(" -> ")));
            }
            if let Some(parent_template) = self.find_wildcard_image(&parent.name) {
                let parent_name = parent.name.clone();
                let rendered_parent = self.generate(&parent_template, &parent_name, version, chain)?;
                to_render.set_parent(Some(rendered_parent));
            }
        }

        let mut rendered = renderer.render(name, version, &to_render)?;
        if rendered.is_wildcard() {
            rendered.version = version.to_string();
        }
        rendered.sanitize();
        rendered.normalize()?;
        debug!("Generated image {} from wildcard '{}'", rendered, wildcard.name);

        Ok(Arc::new(rendered))
    }

    /// Concrete images matching every filter, sorted by name and version
    pub fn select(&self, filters: &[ImageFilter]) -> Vec<Arc<Image>> {
        filter::select_all(&self.list(), filters)
    }

    /// Number of concrete images
    pub fn len(&self) -> usize {
        self.read().images.len()
    }

    /// Whether no concrete image is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageRepository for Catalog {
    fn find_by_name(&self, name: &str) -> Result<Vec<Arc<Image>>> {
        Ok(Catalog::find_by_name(self, name))
    }

    fn find(&self, name: &str, version: &str) -> Result<Option<Arc<Image>>> {
        Ok(Catalog::find(self, name, version))
    }

    fn find_guaranteed(
        &self,
        find_name: &str,
        find_version: &str,
        image_name: &str,
        image_version: &str,
    ) -> Result<Arc<Image>> {
        Catalog::find_guaranteed(self, find_name, find_version, image_name, image_version)
    }

    fn is_wildcard(&self, image: &Image) -> bool {
        Catalog::is_wildcard(self, image)
    }
}
