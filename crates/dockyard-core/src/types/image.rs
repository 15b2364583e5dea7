//! Image entity: a node of the image dependency tree

use crate::error::{Error, Result};
use crate::types::reference::{normalized_name, ImageReference};
use crate::types::value::VarValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Version marking an image as a wildcard template
pub const WILDCARD_VERSION: &str = "*";

/// Characters replaced by `sanitize` to keep versions tag-safe
const SANITIZE_TABLE: &[(&str, &str)] = &[("+", "_")];

/// Container image definition
///
/// Only the attributes are serialized; `parent` and `children` are
/// navigational links. The upward `parent` link holds the ancestor alive so
/// templates can always reach it, while `children` are weak references to
/// images owned by the catalog.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    /// Name of the image
    pub name: String,

    /// Version of the image, `*` for wildcard templates
    pub version: String,

    /// Registry host (e.g., "registry.example.com")
    pub registry_host: String,

    /// Registry namespace (e.g., "platform")
    pub registry_namespace: String,

    /// Extra tags
    pub tags: Vec<String>,

    /// Image labels
    pub labels: BTreeMap<String, String>,

    /// Labels inherited by every descendant
    pub persistent_labels: BTreeMap<String, String>,

    /// Variables
    pub vars: BTreeMap<String, VarValue>,

    /// Variables inherited by every descendant
    pub persistent_vars: BTreeMap<String, VarValue>,

    /// Builder payload, opaque to the catalog and the planners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<VarValue>,

    #[serde(skip)]
    parent: Option<Arc<Image>>,

    #[serde(skip)]
    children: Children,
}

impl Image {
    /// Create a new image, validating its coordinates
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registry_host: impl Into<String>,
        registry_namespace: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let registry_host = registry_host.into();
        check_coordinates(&name, &registry_host)?;

        Ok(Self {
            name,
            version: version.into(),
            registry_host,
            registry_namespace: registry_namespace.into(),
            ..Default::default()
        })
    }

    /// Replace the extra tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add one label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Replace the labels
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Replace the labels inherited by descendants
    pub fn with_persistent_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.persistent_labels = labels;
        self
    }

    /// Add one variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Replace the variables
    pub fn with_vars(mut self, vars: BTreeMap<String, VarValue>) -> Self {
        self.vars = vars;
        self
    }

    /// Replace the variables inherited by descendants
    pub fn with_persistent_vars(mut self, vars: BTreeMap<String, VarValue>) -> Self {
        self.persistent_vars = vars;
        self
    }

    /// Set the builder payload
    pub fn with_builder(mut self, builder: impl Into<VarValue>) -> Self {
        self.builder = Some(builder.into());
        self
    }

    /// Link the direct ancestor
    pub fn with_parent(mut self, parent: Arc<Image>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Direct ancestor, `None` for roots
    pub fn parent(&self) -> Option<&Arc<Image>> {
        self.parent.as_ref()
    }

    /// Replace the parent link
    pub fn set_parent(&mut self, parent: Option<Arc<Image>>) {
        self.parent = parent;
    }

    /// Register a child image
    ///
    /// Safe to call from several threads registering children of the same
    /// parent at once.
    pub fn add_child(&self, child: &Arc<Image>) {
        self.children.push(Arc::downgrade(child));
    }

    /// Live children in registration order
    pub fn children(&self) -> Vec<Arc<Image>> {
        self.children.upgrade_all()
    }

    /// Whether this image is a wildcard template
    pub fn is_wildcard(&self) -> bool {
        self.version == WILDCARD_VERSION
    }

    /// Canonical `host/namespace/name:version` reference
    pub fn reference(&self) -> String {
        normalized_name(
            &self.registry_host,
            &self.registry_namespace,
            &self.name,
            &self.version,
        )
    }

    /// Every `host/namespace/name:tag` reference this image is pushed as:
    /// the version first, then each extra tag
    pub fn references(&self) -> Vec<String> {
        std::iter::once(self.version.as_str())
            .chain(self.tags.iter().map(String::as_str))
            .map(|tag| {
                normalized_name(
                    &self.registry_host,
                    &self.registry_namespace,
                    &self.name,
                    tag,
                )
            })
            .collect()
    }

    /// Make the version usable as an image tag
    pub fn sanitize(&mut self) {
        for (dirty, sane) in SANITIZE_TABLE {
            self.version = self.version.replace(dirty, sane);
        }
    }

    /// Check the coordinates and bring them into canonical form
    ///
    /// Applied to every rendered image. The reference is parsed back into
    /// its components, so a name carrying a path moves that path into the
    /// namespace and an empty version becomes `latest`. An empty registry
    /// host stays empty.
    pub fn normalize(&mut self) -> Result<()> {
        check_coordinates(&self.name, &self.registry_host)?;

        let parsed = if self.registry_host.is_empty() {
            ImageReference::parse_repository(&self.reference())?
        } else {
            ImageReference::parse(&self.reference())?
        };

        self.registry_host = parsed.registry_host;
        self.registry_namespace = parsed.registry_namespace;
        self.name = parsed.name;
        self.version = parsed.version;
        Ok(())
    }

    /// Serialize the image attributes to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Deserialize image attributes from YAML; the result has no links
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}

impl Clone for Image {
    /// Copies attributes and links; the copy has its own children list
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version.clone(),
            registry_host: self.registry_host.clone(),
            registry_namespace: self.registry_namespace.clone(),
            tags: self.tags.clone(),
            labels: self.labels.clone(),
            persistent_labels: self.persistent_labels.clone(),
            vars: self.vars.clone(),
            persistent_vars: self.persistent_vars.clone(),
            builder: self.builder.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
        }
    }
}

impl PartialEq for Image {
    /// Attribute equality; links are ignored
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.registry_host == other.registry_host
            && self.registry_namespace == other.registry_namespace
            && self.tags == other.tags
            && self.labels == other.labels
            && self.persistent_labels == other.persistent_labels
            && self.vars == other.vars
            && self.persistent_vars == other.persistent_vars
            && self.builder == other.builder
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("registry_host", &self.registry_host)
            .field("registry_namespace", &self.registry_namespace)
            .field("tags", &self.tags)
            .field("labels", &self.labels)
            .field("persistent_labels", &self.persistent_labels)
            .field("vars", &self.vars)
            .field("persistent_vars", &self.persistent_vars)
            .field("builder", &self.builder)
            .field("parent", &self.parent.as_ref().map(|p| p.reference()))
            .field("children", &self.children.len())
            .finish()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}

/// Synchronized list of weak child links
#[derive(Default)]
struct Children(RwLock<Vec<Weak<Image>>>);

impl Children {
    fn push(&self, child: Weak<Image>) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
    }

    fn upgrade_all(&self) -> Vec<Arc<Image>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Clone for Children {
    fn clone(&self) -> Self {
        let links = self.0.read().unwrap_or_else(PoisonError::into_inner).clone();
        Self(RwLock::new(links))
    }
}

fn check_coordinates(name: &str, registry_host: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_image("Image name is not provided"));
    }
    if !registry_host.is_empty() && !registry_host.contains('.') {
        return Err(Error::invalid_image(format!(
            "Registry host name '{}' must be a FQDN",
            registry_host
        )));
    }
    Ok(())
}

/// Order images by name, then version
pub fn sort_images(images: &mut [Arc<Image>]) {
    images.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
}
