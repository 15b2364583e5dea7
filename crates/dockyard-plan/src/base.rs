//! Image resolution shared by every planner

use dockyard_catalog::ImageRepository;
use dockyard_core::error::{Error, Result, ResultExt};
use dockyard_core::types::Image;
use std::sync::Arc;
use tracing::debug;

/// Catalog access shared by the planners
#[derive(Clone, Default)]
pub struct BasePlan {
    images: Option<Arc<dyn ImageRepository>>,
}

impl BasePlan {
    pub fn new(images: Option<Arc<dyn ImageRepository>>) -> Self {
        Self { images }
    }

    /// Images store, failing when none was supplied
    pub fn images(&self) -> Result<&Arc<dyn ImageRepository>> {
        self.images.as_ref().ok_or(Error::StoreRequired)
    }

    /// Resolve `name` at each of `versions`, or every stored version of
    /// `name` when `versions` is empty
    ///
    /// Wildcard templates are rendered for versions with no stored image.
    pub fn find_images(&self, name: &str, versions: &[String]) -> Result<Vec<Arc<Image>>> {
        let context = "plan::base::find_images";
        let store = self.images().context(context)?;

        let images = if versions.is_empty() {
            store.find_by_name(name).context(context)?
        } else {
            versions
                .iter()
                .map(|version| store.find_guaranteed(name, version, name, version))
                .collect::<Result<Vec<_>>>()
                .context(context)?
        };

        if images.is_empty() {
            return Err(Error::no_images_found(name, versions).context(context));
        }

        debug!("Resolved {} image(s) for '{}'", images.len(), name);
        Ok(images)
    }
}

impl std::fmt::Debug for BasePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePlan")
            .field("has_images", &self.images.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_catalog::Catalog;
    use dockyard_core::error::ErrorKind;
    use dockyard_core::render::ImageRender;

    fn store() -> Arc<Catalog> {
        let catalog = Catalog::new(Arc::new(ImageRender::new()));
        for version in ["1", "2"] {
            catalog
                .store("app", version, Image::new("app", version, "", "").unwrap())
                .unwrap();
        }
        catalog
            .store("app", "*", Image::new("app", "*", "", "").unwrap())
            .unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_store_required() {
        let err = BasePlan::default().find_images("app", &[]).unwrap_err();
        assert!(matches!(err.root_cause(), Error::StoreRequired));
        assert!(err.to_string().contains("Images storer is nil"));
    }

    #[test]
    fn test_empty_versions_expand_to_every_version() {
        let catalog = store();
        let plan = BasePlan::new(Some(catalog.clone()));

        let images = plan.find_images("app", &[]).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images, catalog.find_by_name("app"));
    }

    #[test]
    fn test_versions_resolved_through_wildcard() {
        let plan = BasePlan::new(Some(store()));
        let versions = vec!["2".to_string(), "3".to_string()];

        let images = plan.find_images("app", &versions).unwrap();
        let resolved: Vec<&str> = images.iter().map(|i| i.version.as_str()).collect();
        assert_eq!(resolved, vec!["2", "3"]);
    }

    #[test]
    fn test_unknown_name() {
        let plan = BasePlan::new(Some(store()));

        let err = plan.find_images("db", &[]).unwrap_err();
        assert!(matches!(err.root_cause(), Error::NoImagesFound { .. }));

        let err = plan.find_images("db", &["1".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }
}
