use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Package versions published by the self-replicating npm worm
/// (September 2025). Each entry is `(name, version)`.
const KNOWN_INFECTED_PACKAGES: &[(&str, &str)] = &[
    ("@ctrl/deluge", "7.2.2"),
    ("@ctrl/golang-template", "1.4.3"),
    ("@ctrl/magnet-link", "4.0.4"),
    ("@ctrl/ngx-codemirror", "7.0.2"),
    ("@ctrl/ngx-csv", "6.0.2"),
    ("@ctrl/ngx-emoji-mart", "9.2.2"),
    ("@ctrl/ngx-rightclick", "4.0.2"),
    ("@ctrl/qbittorrent", "9.7.2"),
    ("@ctrl/react-adsense", "2.0.2"),
    ("@ctrl/shared-torrent", "6.3.2"),
    ("@ctrl/tinycolor", "4.1.1"),
    ("@ctrl/tinycolor", "4.1.2"),
    ("@ctrl/torrent-file", "4.1.2"),
    ("@ctrl/transmission", "7.3.1"),
    ("@ctrl/ts-base32", "4.0.2"),
    ("@nativescript-community/gesturehandler", "2.0.35"),
    ("@nativescript-community/sentry", "4.6.43"),
    ("@nativescript-community/text", "1.6.13"),
    ("@nativescript-community/ui-collectionview", "6.0.6"),
    ("@nativescript-community/ui-document-picker", "1.1.27"),
    ("@nativescript-community/ui-drawer", "0.1.30"),
    ("@nativescript-community/ui-image", "4.5.6"),
    ("@nativescript-community/ui-label", "1.3.35"),
    ("@nativescript-community/ui-label", "1.3.36"),
    ("@nativescript-community/ui-label", "1.3.37"),
    ("@nativescript-community/ui-lottie", "7.0.2"),
    ("@nativescript-community/ui-material-core", "7.2.49"),
    ("@nativescript-community/ui-pager", "14.1.36"),
    ("@nativescript-community/ui-pulltorefresh", "2.5.4"),
    ("angulartics2", "14.1.1"),
    ("angulartics2", "14.1.2"),
    ("encounter-playground", "0.0.2"),
    ("encounter-playground", "0.0.3"),
    ("encounter-playground", "0.0.4"),
    ("encounter-playground", "0.0.5"),
    ("json-rules-engine-simplified", "0.2.1"),
    ("json-rules-engine-simplified", "0.2.4"),
    ("koa2-swagger-ui", "5.11.1"),
    ("koa2-swagger-ui", "5.11.2"),
    ("ng2-file-upload", "7.0.2"),
    ("ng2-file-upload", "7.0.3"),
    ("ng2-file-upload", "8.0.1"),
    ("ng2-file-upload", "8.0.2"),
    ("ng2-file-upload", "8.0.3"),
    ("ng2-file-upload", "9.0.1"),
    ("ngx-bootstrap", "18.1.4"),
    ("ngx-bootstrap", "19.0.3"),
    ("ngx-bootstrap", "19.0.4"),
    ("ngx-bootstrap", "20.0.3"),
    ("ngx-bootstrap", "20.0.4"),
    ("ngx-bootstrap", "20.0.5"),
    ("ngx-color", "10.0.1"),
    ("ngx-color", "10.0.2"),
    ("ngx-toastr", "19.0.1"),
    ("ngx-toastr", "19.0.2"),
    ("ngx-trend", "8.0.1"),
    ("react-complaint-image", "0.0.32"),
    ("react-complaint-image", "0.0.35"),
    ("react-jsonschema-form-conditionals", "0.3.18"),
    ("react-jsonschema-form-conditionals", "0.3.21"),
    ("react-jsonschema-form-extras", "1.0.4"),
    ("rxnt-authentication", "0.0.3"),
    ("rxnt-authentication", "0.0.4"),
    ("rxnt-authentication", "0.0.5"),
    ("rxnt-authentication", "0.0.6"),
    ("rxnt-healthchecks-nestjs", "1.0.2"),
    ("rxnt-healthchecks-nestjs", "1.0.3"),
    ("rxnt-healthchecks-nestjs", "1.0.4"),
    ("rxnt-healthchecks-nestjs", "1.0.5"),
    ("rxnt-kue", "1.0.4"),
    ("rxnt-kue", "1.0.5"),
    ("rxnt-kue", "1.0.6"),
    ("rxnt-kue", "1.0.7"),
    ("swc-plugin-component-annotation", "1.9.1"),
    ("swc-plugin-component-annotation", "1.9.2"),
    ("ts-gaussian", "3.0.5"),
    ("ts-gaussian", "3.0.6"),
];

/// A single compromised package version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfectedPackage {
    pub name: String,
    pub version: String,
}

impl InfectedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse a `name@version` spec. Scoped names keep their leading `@`.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let Some(split) = spec.rfind('@').filter(|&idx| idx > 0) else {
            bail!("'{}' is not of the form name@version", spec);
        };

        let (name, version) = (&spec[..split], &spec[split + 1..]);
        if version.is_empty() {
            bail!("'{}' has an empty version", spec);
        }

        Ok(Self::new(name, version))
    }
}

impl fmt::Display for InfectedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Set of `name@version` strings matched by exact equality.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashSet<String>,
}

impl Registry {
    /// Registry holding the built-in list of compromised versions.
    pub fn builtin() -> Self {
        Self::from_packages(
            KNOWN_INFECTED_PACKAGES
                .iter()
                .map(|(name, version)| InfectedPackage::new(*name, *version)),
        )
    }

    pub fn from_packages(packages: impl IntoIterator<Item = InfectedPackage>) -> Self {
        Self {
            entries: packages.into_iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn extend(&mut self, packages: impl IntoIterator<Item = InfectedPackage>) {
        self.entries
            .extend(packages.into_iter().map(|p| p.to_string()));
    }

    /// Exact match on the `name@version` string, no range semantics.
    pub fn contains(&self, spec: &str) -> bool {
        self.entries.contains(spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_tinycolor() {
        let registry = Registry::builtin();
        assert!(registry.contains("@ctrl/tinycolor@4.1.1"));
        assert!(registry.contains("ngx-bootstrap@18.1.4"));
        assert_eq!(registry.len(), KNOWN_INFECTED_PACKAGES.len());
    }

    #[test]
    fn test_exact_match_only() {
        let registry = Registry::from_packages([InfectedPackage::new("lodash", "4.17.20")]);
        assert!(registry.contains("lodash@4.17.20"));
        assert!(!registry.contains("lodash@4.17.21"));
        assert!(!registry.contains("lodash@4.17"));
        assert!(!registry.contains("lodash"));
    }

    #[test]
    fn test_parse_scoped_spec() {
        let pkg = InfectedPackage::parse("@ctrl/tinycolor@4.1.2").unwrap();
        assert_eq!(pkg.name, "@ctrl/tinycolor");
        assert_eq!(pkg.version, "4.1.2");
        assert_eq!(pkg.to_string(), "@ctrl/tinycolor@4.1.2");
    }

    #[test]
    fn test_parse_rejects_malformed_specs() {
        assert!(InfectedPackage::parse("left-pad").is_err());
        assert!(InfectedPackage::parse("left-pad@").is_err());
        assert!(InfectedPackage::parse("@1.3.0").is_err());
        assert!(InfectedPackage::parse("@scope/pkg").is_err());
    }

    #[test]
    fn test_extend_adds_entries() {
        let mut registry = Registry::builtin();
        let before = registry.len();
        registry.extend([InfectedPackage::parse("left-pad@1.3.0").unwrap()]);
        assert_eq!(registry.len(), before + 1);
        assert!(registry.contains("left-pad@1.3.0"));
    }
}
