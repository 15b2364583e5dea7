//! Definition loading
//!
//! Reads image definition files, merges them and stores every definition in
//! a [`Catalog`], parents before children, wiring the image tree as it goes.

use crate::definitions::{DefinitionKey, ImageDefinition, ImagesFile};
use crate::store::Catalog;
use camino::Utf8Path;
use dockyard_core::config::RegistryDefaults;
use dockyard_core::error::{Error, Result, ResultExt};
use dockyard_core::types::{Image, WILDCARD_VERSION};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::sync::Arc;
use tracing::{debug, info};

/// Collects image definitions and populates a catalog with them
#[derive(Debug, Default)]
pub struct CatalogLoader {
    registry: RegistryDefaults,
    definitions: BTreeMap<DefinitionKey, ImageDefinition>,
    sources: HashMap<DefinitionKey, String>,
}

impl CatalogLoader {
    /// Create a loader filling empty registry coordinates with `registry`
    pub fn new(registry: RegistryDefaults) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Merge definitions from YAML `content`, `source` naming where it came
    /// from in errors
    ///
    /// Returns the number of definitions added.
    pub fn add_yaml(&mut self, content: &str, source: &str) -> Result<usize> {
        let file = ImagesFile::from_yaml(content).context(source)?;
        self.add_file_definitions(file, source)
    }

    fn add_file_definitions(&mut self, file: ImagesFile, source: &str) -> Result<usize> {
        let mut added = 0;
        for (name, version, definition) in file.definitions() {
            let key = (name.to_string(), version.to_string());
            if let Some(previous) = self.sources.get(&key) {
                return Err(Error::duplicate_image(name, version)
                    .context(format!("already defined in {}", previous))
                    .context(source));
            }

            let mut definition = definition.clone();
            definition.apply_defaults(name, version, &self.registry);

            self.sources.insert(key.clone(), source.to_string());
            self.definitions.insert(key, definition);
            added += 1;
        }

        debug!("Read {} image definitions from {}", added, source);
        Ok(added)
    }

    /// Merge definitions from a single file
    pub fn add_file(&mut self, path: &Utf8Path) -> Result<usize> {
        let content = fs::read_to_string(path).context(path.as_str())?;
        self.add_yaml(&content, path.as_str())
    }

    /// Merge definitions from a file, or from every `*.yaml`/`*.yml` file of
    /// a directory in name order
    pub fn load_path(&mut self, path: &Utf8Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        if !path.is_dir() {
            return self.add_file(path);
        }

        let mut files = Vec::new();
        for entry in path.read_dir_utf8().context(path.as_str())? {
            let entry = entry.context(path.as_str())?;
            let file = entry.path();
            if file.is_file() && matches!(file.extension(), Some("yaml" | "yml")) {
                files.push(file.to_path_buf());
            }
        }
        files.sort();

        let mut added = 0;
        for file in &files {
            added += self.add_file(file)?;
        }
        Ok(added)
    }

    /// Number of definitions collected
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definition was collected
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Store every collected definition in `catalog`
    ///
    /// Parents are stored before their children. A child is stored once for
    /// each of its parents, linked to that parent's stored image, except
    /// wildcard templates which are stored once and registered as a child of
    /// every parent. Returns the number of images stored.
    pub fn populate(&self, catalog: &Catalog) -> Result<usize> {
        let context = "loader::populate";

        let graph = self.graph().context(context)?;
        let order = storage_order(&graph).context(context)?;

        // first stored image of every definition, used as the parent of its children
        let mut stored: HashMap<&DefinitionKey, Arc<Image>> = HashMap::new();
        let mut count = 0;

        for index in order {
            let key = &graph[index];
            let (name, version) = key;
            let definition = &self.definitions[key];

            let mut parents: Vec<&DefinitionKey> = graph
                .neighbors_directed(index, Direction::Incoming)
                .map(|parent| &graph[parent])
                .collect();
            parents.sort();

            let parent_images: Vec<Arc<Image>> = parents
                .iter()
                .filter_map(|parent| stored.get(parent).cloned())
                .collect();

            if parent_images.is_empty() {
                let image = catalog
                    .store(name, version, definition.to_image())
                    .context(context)?;
                debug!("Stored root image {}", image);
                stored.insert(key, image);
                count += 1;
                continue;
            }

            if version == WILDCARD_VERSION {
                let image = definition.to_image().with_parent(parent_images[0].clone());
                let image = catalog.store(name, version, image).context(context)?;
                for parent in &parent_images {
                    parent.add_child(&image);
                }
                debug!("Stored wildcard image {} under {} parent(s)", name, parent_images.len());
                stored.insert(key, image);
                count += 1;
                continue;
            }

            for parent in &parent_images {
                let image = definition.to_image().with_parent(parent.clone());
                let image = catalog.store(name, version, image).context(context)?;
                parent.add_child(&image);
                debug!("Stored image {} as child of {}", image, parent);
                stored.entry(key).or_insert(image);
                count += 1;
            }
        }

        info!(
            "Loaded {} images from {} definitions into the catalog",
            count,
            self.definitions.len()
        );
        Ok(count)
    }

    /// Parent -> child graph over every definition, nodes added in key order
    fn graph(&self) -> Result<DiGraph<DefinitionKey, ()>> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&DefinitionKey, NodeIndex> = HashMap::new();
        for key in self.definitions.keys() {
            nodes.insert(key, graph.add_node(key.clone()));
        }

        for (key, definition) in &self.definitions {
            let node = nodes[key];

            for parent in definition.parent_keys() {
                let parent_node = nodes.get(&parent).copied().ok_or_else(|| {
                    Error::orphan_reference(&key.0, &key.1, format!("{}:{}", parent.0, parent.1))
                })?;
                graph.update_edge(parent_node, node, ());
            }

            for child in definition.child_keys() {
                let child_node = nodes.get(&child).copied().ok_or_else(|| {
                    Error::invalid_config(format!(
                        "Image '{}:{}' declares undefined child '{}:{}'",
                        key.0, key.1, child.0, child.1
                    ))
                })?;
                graph.update_edge(node, child_node, ());
            }
        }

        Ok(graph)
    }
}

/// Topological order of `graph`, lowest key first among the images ready to
/// be stored, so that children are registered in a stable order
fn storage_order(graph: &DiGraph<DefinitionKey, ()>) -> Result<Vec<NodeIndex>> {
    let mut pending: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ready: BTreeSet<NodeIndex> = graph
        .node_indices()
        .filter(|node| pending[node.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for child in graph.neighbors_directed(node, Direction::Outgoing) {
            pending[child.index()] -= 1;
            if pending[child.index()] == 0 {
                ready.insert(child);
            }
        }
    }

    // whatever never became ready sits on, or below, a cycle
    if order.len() < graph.node_count() {
        let blocked: Vec<String> = graph
            .node_indices()
            .filter(|node| pending[node.index()] > 0)
            .map(|node| format!("{}:{}", graph[node].0, graph[node].1))
            .collect();
        return Err(Error::circular_dependency(blocked.join(", ")));
    }

    Ok(order)
}
