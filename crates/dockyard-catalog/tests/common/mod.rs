//! Common test helpers for dockyard-catalog integration tests
//!
//! - Catalog builders with a fixed render clock
//! - Definition file fixtures written to temporary directories

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeZone, Utc};
use dockyard_catalog::{Catalog, CatalogLoader};
use dockyard_core::render::{FixedClock, ImageRender};
use dockyard_core::RegistryDefaults;
use std::sync::Arc;
use tempfile::TempDir;

// ─── Catalog Builders ────────────────────────────────────────────────────────

/// Catalog rendering with a clock frozen at 2024-05-01T10:00:00Z
#[allow(dead_code)]
pub fn catalog() -> Catalog {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Catalog::new(Arc::new(ImageRender::with_clock(Arc::new(FixedClock(now)))))
}

/// Catalog populated from inline definitions
#[allow(dead_code)]
pub fn catalog_from_yaml(content: &str) -> Catalog {
    let mut loader = CatalogLoader::new(RegistryDefaults::default());
    loader.add_yaml(content, "inline").unwrap();
    let catalog = catalog();
    loader.populate(&catalog).unwrap();
    catalog
}

// ─── Definition Files ────────────────────────────────────────────────────────

/// Temporary directory holding definition files
pub struct DefinitionsDir {
    pub dir: TempDir,
}

impl DefinitionsDir {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Utf8Path {
        Utf8Path::from_path(self.dir.path()).unwrap()
    }

    /// Write `content` to `file_name` inside the directory
    #[allow(dead_code)]
    pub fn write(&self, file_name: &str, content: &str) -> Utf8PathBuf {
        let path = self.path().join(file_name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Three generations: alpine -> base -> app, app built for two base versions
#[allow(dead_code)]
pub const TREE_YAML: &str = r#"
images:
  alpine:
    "3.19":
      registry: registry.example.com
      namespace: library
      tags: ["3"]
  base:
    "1":
      registry: registry.example.com
      namespace: platform
      parents:
        alpine: ["3.19"]
    "2":
      registry: registry.example.com
      namespace: platform
      parents:
        alpine: ["3.19"]
  app:
    "1.0":
      version: "{{ version }}-base{{ parent.version }}"
      registry: registry.example.com
      namespace: team
      parents:
        base: ["1", "2"]
"#;

/// Concrete grandparent, wildcard parent and wildcard child
#[allow(dead_code)]
pub const WILDCARD_YAML: &str = r#"
images:
  alpine:
    "3.19": {}
  base:
    "*":
      version: "{{ parent.version }}"
      labels:
        created: "{{ date_rfc3339 }}"
      parents:
        alpine: ["3.19"]
  app:
    "*":
      version: "{{ version }}-{{ parent.version }}"
      vars:
        base_image: "{{ parent.name }}:{{ parent.version }}"
      parents:
        base: ["*"]
"#;
