//! Definition file loading into a catalog

mod common;

use common::{catalog, DefinitionsDir, TREE_YAML};
use dockyard_catalog::{CatalogLoader, ImageRepository};
use dockyard_core::{Error, ErrorKind, RegistryDefaults};
use std::sync::Arc;

#[test]
fn test_load_directory_merges_files_in_order() {
    let defs = DefinitionsDir::new();
    defs.write(
        "10-base.yaml",
        "images:\n  alpine:\n    \"3.19\": {}\n  base:\n    \"1\":\n      parents:\n        alpine: [\"3.19\"]\n",
    );
    defs.write(
        "20-apps.yml",
        "images:\n  app:\n    \"1\":\n      parents:\n        base: [\"1\"]\n",
    );
    defs.write("README.md", "not a definitions file");

    let mut loader = CatalogLoader::default();
    assert_eq!(loader.load_path(defs.path()).unwrap(), 3);

    let c = catalog();
    assert_eq!(loader.populate(&c).unwrap(), 3);

    let app = c.find("app", "1").unwrap();
    let base = app.parent().unwrap();
    assert_eq!(base.name, "base");
    assert_eq!(base.parent().unwrap().name, "alpine");
}

#[test]
fn test_load_single_file() {
    let defs = DefinitionsDir::new();
    let file = defs.write("images.yaml", TREE_YAML);

    let mut loader = CatalogLoader::default();
    assert_eq!(loader.load_path(&file).unwrap(), 4);
}

#[test]
fn test_load_missing_path() {
    let defs = DefinitionsDir::new();
    let mut loader = CatalogLoader::default();

    let err = loader.load_path(&defs.path().join("missing")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_duplicate_across_files() {
    let defs = DefinitionsDir::new();
    defs.write("a.yaml", "images:\n  app:\n    \"1\": {}\n");
    defs.write("b.yaml", "images:\n  app:\n    \"1\":\n      tags: [latest]\n");

    let mut loader = CatalogLoader::default();
    let err = loader.load_path(defs.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert!(err.to_string().contains("a.yaml"));
    assert!(err.to_string().contains("b.yaml"));
}

#[test]
fn test_malformed_file_names_source() {
    let defs = DefinitionsDir::new();
    defs.write("broken.yaml", "images: [");

    let mut loader = CatalogLoader::default();
    let err = loader.load_path(defs.path()).unwrap_err();
    assert!(matches!(err.root_cause(), Error::YamlParse(_)));
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn test_child_stored_once_per_parent() {
    let c = common::catalog_from_yaml(TREE_YAML);

    // alpine, base 1 and 2, app once under each base
    assert_eq!(c.len(), 5);

    let apps = c.find_by_name("app");
    let versions: Vec<&str> = apps.iter().map(|i| i.version.as_str()).collect();
    assert_eq!(versions, vec!["1.0-base1", "1.0-base2"]);

    for app in &apps {
        let base = app.parent().unwrap();
        assert!(app.version.ends_with(&base.version));
        assert!(base.children().iter().any(|child| Arc::ptr_eq(child, app)));
    }

    let alpine = c.find("alpine", "3").unwrap();
    assert_eq!(alpine.version, "3.19");
    assert_eq!(alpine.children().len(), 2);
}

#[test]
fn test_find_by_definition_version() {
    let c = common::catalog_from_yaml(TREE_YAML);

    let app = c.find("app", "1.0").unwrap();
    assert_eq!(app.version, "1.0-base1");
    assert_eq!(app.reference(), "registry.example.com/team/app:1.0-base1");
}

#[test]
fn test_repository_view() {
    let c = common::catalog_from_yaml(TREE_YAML);
    let repo: &dyn ImageRepository = &c;

    assert_eq!(repo.find_by_name("base").unwrap().len(), 2);
    assert!(repo.find("base", "3").unwrap().is_none());
    assert_eq!(
        repo.find_guaranteed("base", "2", "base", "2").unwrap().version,
        "2"
    );
    assert!(repo.find_guaranteed("base", "3", "base", "3").is_err());
}

#[test]
fn test_populate_is_repeatable_on_fresh_catalogs() {
    let mut loader = CatalogLoader::new(RegistryDefaults::default());
    loader.add_yaml(TREE_YAML, "inline").unwrap();

    let first = catalog();
    let second = catalog();
    loader.populate(&first).unwrap();
    loader.populate(&second).unwrap();

    let refs = |c: &dockyard_catalog::Catalog| -> Vec<String> {
        c.list().iter().map(|i| i.reference()).collect()
    };
    assert_eq!(refs(&first), refs(&second));

    // populating the same catalog twice collides with the first run
    let err = loader.populate(&first).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
}
