//! Common test helpers for dockyard-plan integration tests
//!
//! - Catalog fixtures loaded from inline definitions
//! - A minimal concurrent executor that records completion order

use dockyard_catalog::{Catalog, CatalogLoader, ImageRepository};
use dockyard_core::render::ImageRender;
use dockyard_core::RegistryDefaults;
use dockyard_plan::Step;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Route planner logs to the test output, filtered by `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// alpine -> base -> {app, worker}, plus a wildcard child of base
#[allow(dead_code)]
pub const TREE_YAML: &str = r#"
images:
  alpine:
    "3.19": {}
  base:
    "1":
      parents:
        alpine: ["3.19"]
    "2":
      parents:
        alpine: ["3.19"]
  app:
    "1":
      parents:
        base: ["1"]
  worker:
    "1":
      parents:
        base: ["1"]
  tool:
    "*":
      parents:
        base: ["1"]
"#;

/// Images store populated from `content`
#[allow(dead_code)]
pub fn store_from_yaml(content: &str) -> Arc<dyn ImageRepository> {
    init_tracing();
    let mut loader = CatalogLoader::new(RegistryDefaults::default());
    loader.add_yaml(content, "inline").unwrap();
    let catalog = Catalog::new(Arc::new(ImageRender::new()));
    loader.populate(&catalog).unwrap();
    Arc::new(catalog)
}

// ─── Execution ───────────────────────────────────────────────────────────────

/// Run every step concurrently, each waiting on its gate, "building" for a
/// moment and notifying its subscribers
///
/// Returns step names in completion order.
#[allow(dead_code)]
pub async fn execute(steps: Vec<Step>) -> Vec<String> {
    let completed = Arc::new(Mutex::new(Vec::new()));

    // dispatch children first so ordering can only come from the gates
    let handles: Vec<_> = steps
        .into_iter()
        .rev()
        .map(|step| {
            let completed = completed.clone();
            tokio::spawn(async move {
                step.wait().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                completed
                    .lock()
                    .unwrap()
                    .push(format!("{}:{}", step.image().name, step.image().version));
                step.notify();
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let order = completed.lock().unwrap().clone();
    order
}

/// Position of `reference` in a completion order
#[allow(dead_code)]
pub fn position(order: &[String], reference: &str) -> usize {
    order
        .iter()
        .position(|r| r == reference)
        .unwrap_or_else(|| panic!("{} was not executed: {:?}", reference, order))
}
