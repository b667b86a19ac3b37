use crate::registry::Registry;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const PACKAGE_LOCK_FILE: &str = "package-lock.json";
pub const PACKAGE_MANIFEST_FILE: &str = "package.json";

const NODE_MODULES_PREFIX: &str = "node_modules/";
const NESTED_NODE_MODULES: &str = "/node_modules/";

/// npm lockfile (v2/v3). Only the flat `packages` map is read.
#[derive(Debug, Default, Deserialize)]
pub struct PackageLock {
    #[serde(default)]
    packages: Option<BTreeMap<String, LockedPackage>>,
}

#[derive(Debug, Default, Deserialize)]
struct LockedPackage {
    #[serde(default)]
    version: Value,
}

impl PackageLock {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse package-lock.json")
    }

    /// `(name, version)` for every locked package other than the root entry.
    /// Entries without a string `version` are skipped.
    pub fn locked_packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages
            .iter()
            .flatten()
            .filter(|(path, _)| !path.is_empty())
            .filter_map(|(path, pkg)| {
                let version = pkg.version.as_str()?;
                Some((extract_package_name(path), version))
            })
    }

    /// Every locked `name@version` present in the registry.
    pub fn find_infected(&self, registry: &Registry) -> Vec<String> {
        self.locked_packages()
            .map(|(name, version)| format!("{}@{}", name, version))
            .filter(|spec| registry.contains(spec))
            .collect()
    }
}

/// Package name for a `packages` key such as `node_modules/a/node_modules/@s/b`.
pub fn extract_package_name(path: &str) -> &str {
    let name = path.strip_prefix(NODE_MODULES_PREFIX).unwrap_or(path);

    if name.starts_with('@') && name.contains('/') && !name.contains(NESTED_NODE_MODULES) {
        return name;
    }

    match name.rfind(NESTED_NODE_MODULES) {
        Some(idx) => &name[idx + NESTED_NODE_MODULES.len()..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InfectedPackage;

    fn registry(specs: &[&str]) -> Registry {
        Registry::from_packages(specs.iter().map(|s| InfectedPackage::parse(s).unwrap()))
    }

    #[test]
    fn test_extract_simple_name() {
        assert_eq!(extract_package_name("node_modules/simple"), "simple");
    }

    #[test]
    fn test_extract_scoped_name() {
        assert_eq!(extract_package_name("node_modules/@scope/pkg"), "@scope/pkg");
    }

    #[test]
    fn test_extract_nested_name() {
        assert_eq!(extract_package_name("node_modules/a/node_modules/b"), "b");
        assert_eq!(
            extract_package_name("node_modules/a/node_modules/b/node_modules/c"),
            "c"
        );
    }

    #[test]
    fn test_extract_nested_scoped_name() {
        assert_eq!(
            extract_package_name("node_modules/@scope/a/node_modules/@other/b"),
            "@other/b"
        );
        assert_eq!(
            extract_package_name("node_modules/plain/node_modules/@ctrl/tinycolor"),
            "@ctrl/tinycolor"
        );
    }

    #[test]
    fn test_finds_infected_package() {
        let lock = PackageLock::parse(
            r#"{
                "name": "action",
                "lockfileVersion": 3,
                "packages": {
                    "": { "name": "action", "version": "1.0.0" },
                    "node_modules/left-pad": { "version": "1.3.0" },
                    "node_modules/lodash": { "version": "4.17.21" }
                }
            }"#,
        )
        .unwrap();

        let infected = lock.find_infected(&registry(&["left-pad@1.3.0", "lodash@4.17.20"]));
        assert_eq!(infected, vec!["left-pad@1.3.0"]);
    }

    #[test]
    fn test_root_entry_is_ignored() {
        let lock = PackageLock::parse(
            r#"{ "packages": { "": { "name": "left-pad", "version": "1.3.0" } } }"#,
        )
        .unwrap();
        assert_eq!(lock.locked_packages().count(), 0);
    }

    #[test]
    fn test_entries_without_string_version_are_skipped() {
        let lock = PackageLock::parse(
            r#"{
                "packages": {
                    "node_modules/linked": { "link": true, "resolved": "../linked" },
                    "node_modules/odd": { "version": 3 },
                    "node_modules/ok": { "version": "2.0.0" }
                }
            }"#,
        )
        .unwrap();
        let packages: Vec<_> = lock.locked_packages().collect();
        assert_eq!(packages, vec![("ok", "2.0.0")]);
    }

    #[test]
    fn test_v1_lockfile_has_no_packages() {
        let lock = PackageLock::parse(
            r#"{ "lockfileVersion": 1, "dependencies": { "left-pad": { "version": "1.3.0" } } }"#,
        )
        .unwrap();
        assert!(lock.find_infected(&registry(&["left-pad@1.3.0"])).is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(PackageLock::parse("{ not json").is_err());
        assert!(PackageLock::parse(r#"{ "packages": [] }"#).is_err());
    }
}
