//! Image definition files
//!
//! A definitions file maps image names to versions to definitions:
//!
//! ```yaml
//! images:
//!   base:
//!     "3.19":
//!       registry: registry.example.com
//!       tags: ["3"]
//!   app:
//!     "*":
//!       version: "{{ version }}-{{ parent.version }}"
//!       parents:
//!         base: ["3.19"]
//! ```
//!
//! Relationships may be declared on either side, with `parents` on the child
//! or `children` on the parent.

use dockyard_core::config::RegistryDefaults;
use dockyard_core::error::{Error, Result};
use dockyard_core::types::{Image, VarValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name/version coordinates of a definition
pub type DefinitionKey = (String, String);

/// One image version as written in a definitions file
///
/// Every attribute may hold template text; nothing is validated as an
/// image until it is rendered by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDefinition {
    /// Defaults to the name key of the definition
    pub name: String,

    /// Defaults to the version key of the definition
    pub version: String,

    #[serde(rename = "registry")]
    pub registry_host: String,

    #[serde(rename = "namespace")]
    pub registry_namespace: String,

    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub persistent_labels: BTreeMap<String, String>,
    pub vars: BTreeMap<String, VarValue>,
    pub persistent_vars: BTreeMap<String, VarValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<VarValue>,

    /// Parent name -> parent versions
    pub parents: BTreeMap<String, Vec<String>>,

    /// Child name -> child versions
    pub children: BTreeMap<String, Vec<String>>,
}

impl ImageDefinition {
    /// Fill empty coordinates from the definition keys and registry defaults
    pub fn apply_defaults(&mut self, name: &str, version: &str, registry: &RegistryDefaults) {
        if self.name.is_empty() {
            self.name = name.to_string();
        }
        if self.version.is_empty() {
            self.version = version.to_string();
        }
        if self.registry_host.is_empty() {
            self.registry_host = registry.host.clone();
        }
        if self.registry_namespace.is_empty() {
            self.registry_namespace = registry.namespace.clone();
        }
    }

    /// Every declared parent as a definition key
    pub fn parent_keys(&self) -> impl Iterator<Item = DefinitionKey> + '_ {
        expand_keys(&self.parents)
    }

    /// Every declared child as a definition key
    pub fn child_keys(&self) -> impl Iterator<Item = DefinitionKey> + '_ {
        expand_keys(&self.children)
    }

    /// Build the unrendered image described by this definition
    ///
    /// The registry host is not checked here since it may still be a
    /// template.
    pub fn to_image(&self) -> Image {
        let mut image = Image::default();
        image.name = self.name.clone();
        image.version = self.version.clone();
        image.registry_host = self.registry_host.clone();
        image.registry_namespace = self.registry_namespace.clone();
        image.tags = self.tags.clone();
        image.labels = self.labels.clone();
        image.persistent_labels = self.persistent_labels.clone();
        image.vars = self.vars.clone();
        image.persistent_vars = self.persistent_vars.clone();
        image.builder = self.builder.clone();
        image
    }
}

fn expand_keys(relations: &BTreeMap<String, Vec<String>>) -> impl Iterator<Item = DefinitionKey> + '_ {
    relations.iter().flat_map(|(name, versions)| {
        versions
            .iter()
            .map(move |version| (name.clone(), version.clone()))
    })
}

/// Contents of one definitions file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesFile {
    /// Name -> version -> definition
    pub images: BTreeMap<String, BTreeMap<String, ImageDefinition>>,
}

impl ImagesFile {
    /// Parse and validate a definitions file
    ///
    /// Empty content is an empty file.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: ImagesFile = serde_yaml_ng::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Check every key used as image coordinates
    pub fn validate(&self) -> Result<()> {
        for (name, versions) in &self.images {
            validate_key(name, "name")?;
            for (version, definition) in versions {
                validate_key(version, "version")?;
                for (related, related_versions) in
                    definition.parents.iter().chain(definition.children.iter())
                {
                    validate_key(related, "name")?;
                    for related_version in related_versions {
                        validate_key(related_version, "version")?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Iterate definitions with their keys, sorted by name and version
    pub fn definitions(&self) -> impl Iterator<Item = (&str, &str, &ImageDefinition)> {
        self.images.iter().flat_map(|(name, versions)| {
            versions
                .iter()
                .map(move |(version, definition)| (name.as_str(), version.as_str(), definition))
        })
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.images.values().map(BTreeMap::len).sum()
    }

    /// Whether the file defines no image
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_key(key: &str, what: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_image(format!("Image {} must not be empty", what)));
    }
    if key.contains(':') {
        return Err(Error::invalid_image(format!(
            "Image {} '{}' must not contain ':'",
            what, key
        )));
    }
    Ok(())
}
