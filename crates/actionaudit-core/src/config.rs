use crate::providers::github_api::DEFAULT_API_URL;
use crate::registry::{InfectedPackage, Registry};
use crate::scanner::{ScanOptions, DEFAULT_PAGE_SIZE};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".actionaudit.toml";

/// Audit configuration loaded from `.actionaudit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuditConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum repositories to scan; 0 disables the cap
    #[serde(default)]
    pub max_repos: usize,

    /// Repositories requested per listing page (1-100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// REST API root, e.g. `https://ghe.example.com/api/v3`
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_repos: 0,
            per_page: default_per_page(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Additional compromised versions as `name@version`
    #[serde(default)]
    pub extra_packages: Vec<String>,
}

fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<AuditConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config: AuditConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    Ok(config)
}

impl AuditConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=100).contains(&self.scan.per_page) {
            bail!("scan.per_page must be between 1 and 100, got {}", self.scan.per_page);
        }
        if self.scan.api_url.trim().is_empty() {
            bail!("scan.api_url must not be empty");
        }
        self.extra_packages()?;
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_repos: (self.scan.max_repos > 0).then_some(self.scan.max_repos),
            per_page: self.scan.per_page,
        }
    }

    /// Built-in registry plus any configured extra packages.
    pub fn registry(&self) -> anyhow::Result<Registry> {
        let mut registry = Registry::builtin();
        registry.extend(self.extra_packages()?);
        Ok(registry)
    }

    fn extra_packages(&self) -> anyhow::Result<Vec<InfectedPackage>> {
        self.registry
            .extra_packages
            .iter()
            .map(|spec| {
                InfectedPackage::parse(spec)
                    .with_context(|| format!("Invalid registry.extra_packages entry '{}'", spec))
            })
            .collect()
    }
}
