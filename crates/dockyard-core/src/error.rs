//! Error types for dockyard
//!
//! A single error enum is shared by the catalog and the planners so that a
//! failure deep in template rendering reaches the caller with every
//! operation it crossed attached as context.

use thiserror::Error;

/// Result type alias using dockyard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause attached to rendering failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing collaborator, missing parameter or unknown identifier
    Configuration,
    /// Requested image could not be found
    Lookup,
    /// Template rendering or its (de)serialization failed
    Render,
    /// Name/version registered twice
    Duplicate,
    /// Malformed image or definition
    InvalidInput,
    /// Filesystem or parse failure while reading files
    Io,
}

/// Dockyard error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A planner was built or used without an images store
    #[error("Images storer is nil")]
    StoreRequired,

    /// The catalog has no renderer to materialize images
    #[error("To add an image to the store an image renderer is required")]
    RendererRequired,

    /// A planner parameter is missing
    #[error("To create a {plan} plan, '{parameter}' is required")]
    MissingParameter { plan: String, parameter: String },

    /// Unknown plan identifier
    #[error("Plan '{id}' has not been registered. Valid plans: cascade, single")]
    UnknownPlan { id: String },

    /// Image missing from the catalog, even after wildcard resolution
    #[error("Image '{name}:{version}' does not exist on the store")]
    ImageNotFound { name: String, version: String },

    /// No image resolved for a name and version set
    #[error("No images found for name '{name}' and version(s) {versions:?}")]
    NoImagesFound { name: String, versions: Vec<String> },

    /// Template rendering failed
    #[error("Render failed for image '{image}': {source}")]
    Render {
        image: String,
        #[source]
        source: BoxError,
    },

    /// An image with the same name and version is already stored
    #[error("Image '{name}:{version}' already exists on the store")]
    DuplicateImage { name: String, version: String },

    /// A wildcard template for the name is already stored
    #[error("Image '{name}' already exists on wildcard images index")]
    DuplicateWildcard { name: String },

    /// Malformed image or definition
    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    /// Parent/child definitions loop back on themselves
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// A definition names a parent that is never defined
    #[error("Image '{name}:{version}' references undefined parent '{parent}'")]
    OrphanReference {
        name: String,
        version: String,
        parent: String,
    },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any error annotated with the operation that produced it
    #[error("({context}) {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(plan: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            plan: plan.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an unknown plan error
    pub fn unknown_plan(id: impl Into<String>) -> Self {
        Self::UnknownPlan { id: id.into() }
    }

    /// Create an image not found error
    pub fn image_not_found(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::ImageNotFound {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Create a no images found error
    pub fn no_images_found(name: impl Into<String>, versions: &[String]) -> Self {
        Self::NoImagesFound {
            name: name.into(),
            versions: versions.to_vec(),
        }
    }

    /// Create a render error from any cause
    pub fn render(image: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Render {
            image: image.into(),
            source: source.into(),
        }
    }

    /// Create a duplicate image error
    pub fn duplicate_image(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::DuplicateImage {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Create a duplicate wildcard error
    pub fn duplicate_wildcard(name: impl Into<String>) -> Self {
        Self::DuplicateWildcard { name: name.into() }
    }

    /// Create an invalid image error
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Create a circular dependency error
    pub fn circular_dependency(cycle: impl Into<String>) -> Self {
        Self::CircularDependency {
            cycle: cycle.into(),
        }
    }

    /// Create an orphan reference error
    pub fn orphan_reference(
        name: impl Into<String>,
        version: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self::OrphanReference {
            name: name.into(),
            version: version.into(),
            parent: parent.into(),
        }
    }

    /// Wrap this error with the operation that produced it
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping every context wrapper
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Error::ConfigNotFound { .. }
            | Error::InvalidConfig { .. }
            | Error::StoreRequired
            | Error::RendererRequired
            | Error::MissingParameter { .. }
            | Error::UnknownPlan { .. } => ErrorKind::Configuration,
            Error::ImageNotFound { .. } | Error::NoImagesFound { .. } => ErrorKind::Lookup,
            Error::Render { .. } => ErrorKind::Render,
            Error::DuplicateImage { .. } | Error::DuplicateWildcard { .. } => {
                ErrorKind::Duplicate
            }
            Error::InvalidImage { .. }
            | Error::CircularDependency { .. }
            | Error::OrphanReference { .. } => ErrorKind::InvalidInput,
            Error::YamlParse(_) | Error::Io(_) => ErrorKind::Io,
            // root_cause never stops on a wrapper
            Error::Context { source, .. } => source.kind(),
        }
    }
}

/// Attach operation context to the error side of a `Result`
pub trait ResultExt<T> {
    /// Wrap the error, if any, with `context`
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_root_cause() {
        let err = Error::image_not_found("app", "1.0")
            .context("catalog::find_guaranteed")
            .context("plan::cascade");

        assert!(matches!(err.root_cause(), Error::ImageNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(
            err.to_string(),
            "(plan::cascade) (catalog::find_guaranteed) Image 'app:1.0' does not exist on the store"
        );
    }

    #[test]
    fn test_result_ext_wraps_error() {
        let res: std::result::Result<(), Error> = Err(Error::StoreRequired);
        let err = res.context("plan::base").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "(plan::base) Images storer is nil");
    }

    #[test]
    fn test_render_error_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::render("app:1.0", cause);
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_duplicate_kind() {
        assert_eq!(
            Error::duplicate_wildcard("app").kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(
            Error::duplicate_image("app", "1").kind(),
            ErrorKind::Duplicate
        );
    }
}
