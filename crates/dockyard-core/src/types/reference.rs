//! Image reference parsing and normalization

use crate::error::{Error, Result};
use std::fmt;

/// Registry used when a reference names none
pub const DEFAULT_REGISTRY_HOST: &str = "docker.io";

/// Namespace implied for single-component names on the default registry
pub const DEFAULT_REGISTRY_NAMESPACE: &str = "library";

/// Tag used when a reference names none
pub const DEFAULT_TAG: &str = "latest";

/// Container image reference split into the coordinates an image carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "registry.example.com", "docker.io")
    pub registry_host: String,
    /// Repository path without the image name (e.g., "platform/base")
    pub registry_namespace: String,
    /// Last path component (e.g., "ubuntu")
    pub name: String,
    /// Tag (e.g., "22.04")
    pub version: String,
}

impl ImageReference {
    /// Parse a reference like "registry.example.com/platform/app:1.0"
    ///
    /// Follows the docker normalization rules: the first component is a
    /// registry host only when it contains '.' or ':' or is "localhost";
    /// names on the default registry without a namespace land in "library";
    /// a missing tag becomes "latest". Digest references are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::invalid_image("Image reference is empty"));
        }

        let (host, remainder) = match s.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, rest)
            }
            _ => (DEFAULT_REGISTRY_HOST, s),
        };

        let mut reference = Self::parse_repository(remainder).map_err(|_| unparsable(s))?;
        reference.registry_host = host.to_string();
        if host == DEFAULT_REGISTRY_HOST && reference.registry_namespace.is_empty() {
            reference.registry_namespace = DEFAULT_REGISTRY_NAMESPACE.to_string();
        }
        Ok(reference)
    }

    /// Parse a repository path with an optional tag, like "platform/app:1.0"
    ///
    /// No registry host is recognized or implied: the whole path up to the
    /// last component is the namespace. A missing tag becomes "latest".
    pub fn parse_repository(s: &str) -> Result<Self> {
        if s.contains('@') {
            return Err(Error::invalid_image(format!(
                "Image '{}' could not be parsed: digest references are not supported",
                s
            )));
        }

        // A ':' after the last '/' separates the tag
        let (path, tag) = match s.rfind(':') {
            Some(idx) if !s[idx..].contains('/') => (&s[..idx], &s[idx + 1..]),
            _ => (s, DEFAULT_TAG),
        };

        if path.is_empty() || path.split('/').any(str::is_empty) {
            return Err(unparsable(s));
        }
        if !is_valid_tag(tag) {
            return Err(Error::invalid_image(format!(
                "Image '{}' could not be parsed: invalid tag '{}'",
                s, tag
            )));
        }
        if path.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(Error::invalid_image(format!(
                "Image '{}' could not be parsed: repository name must be lowercase",
                s
            )));
        }

        let (namespace, name) = path.rsplit_once('/').unwrap_or(("", path));

        Ok(Self {
            registry_host: String::new(),
            registry_namespace: namespace.to_string(),
            name: name.to_string(),
            version: tag.to_string(),
        })
    }
}

fn unparsable(s: &str) -> Error {
    Error::invalid_image(format!("Image '{}' could not be parsed", s))
}

/// Docker tag grammar: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    tag.len() <= 128
        && (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            normalized_name(
                &self.registry_host,
                &self.registry_namespace,
                &self.name,
                &self.version
            )
        )
    }
}

/// Join image coordinates into `host/namespace/name:version`, skipping
/// empty components
pub fn normalized_name(host: &str, namespace: &str, name: &str, version: &str) -> String {
    let mut reference = String::new();
    for part in [host, namespace] {
        if !part.is_empty() {
            reference.push_str(part);
            reference.push('/');
        }
    }
    reference.push_str(name);
    if !version.is_empty() {
        reference.push(':');
        reference.push_str(version);
    }
    reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_reference() {
        let r = ImageReference::parse("registry.example.com/platform/base/app:1.2.3").unwrap();
        assert_eq!(r.registry_host, "registry.example.com");
        assert_eq!(r.registry_namespace, "platform/base");
        assert_eq!(r.name, "app");
        assert_eq!(r.version, "1.2.3");
    }

    #[test]
    fn test_parse_short_name_defaults() {
        let r = ImageReference::parse("ubuntu").unwrap();
        assert_eq!(r.registry_host, "docker.io");
        assert_eq!(r.registry_namespace, "library");
        assert_eq!(r.name, "ubuntu");
        assert_eq!(r.version, "latest");
        assert_eq!(r.to_string(), "docker.io/library/ubuntu:latest");
    }

    #[test]
    fn test_parse_registry_with_port() {
        let r = ImageReference::parse("localhost:5000/app:dev").unwrap();
        assert_eq!(r.registry_host, "localhost:5000");
        assert_eq!(r.registry_namespace, "");
        assert_eq!(r.name, "app");
        assert_eq!(r.version, "dev");
        assert_eq!(r.to_string(), "localhost:5000/app:dev");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("app@sha256:abc").is_err());
        assert!(ImageReference::parse("ns//app:1").is_err());
        assert!(ImageReference::parse("App:1").is_err());
    }

    #[test]
    fn test_parse_repository_implies_no_registry() {
        let r = ImageReference::parse_repository("team/app").unwrap();
        assert_eq!(r.registry_host, "");
        assert_eq!(r.registry_namespace, "team");
        assert_eq!(r.name, "app");
        assert_eq!(r.version, "latest");

        let r = ImageReference::parse_repository("app:1.0_linux").unwrap();
        assert_eq!(r.registry_namespace, "");
        assert_eq!(r.to_string(), "app:1.0_linux");
    }

    #[test]
    fn test_parse_rejects_invalid_tags() {
        assert!(ImageReference::parse_repository("app:1+linux").is_err());
        assert!(ImageReference::parse_repository("app:-1").is_err());
        assert!(ImageReference::parse_repository("app:{{ version }}").is_err());
        assert!(ImageReference::parse(&format!("app:{}", "1".repeat(129))).is_err());
    }

    #[test]
    fn test_normalized_name_skips_empty_parts() {
        assert_eq!(normalized_name("", "", "app", "1"), "app:1");
        assert_eq!(normalized_name("r.io", "", "app", ""), "r.io/app");
        assert_eq!(normalized_name("r.io", "ns", "app", "1"), "r.io/ns/app:1");
    }
}
