use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every distinct action reference seen in the organization, keyed by the
/// literal `uses:` string.
pub type UsageMap = BTreeMap<String, ActionUsage>;

/// One action reference and what is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionUsage {
    pub reference: String,
    pub used_by_repositories: BTreeSet<String>,
    pub uses_npm: bool,
    pub is_infected: bool,
    pub infected_packages: Vec<String>,
    #[serde(skip)]
    pub analyzed: bool,
}

impl ActionUsage {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            used_by_repositories: BTreeSet::new(),
            uses_npm: false,
            is_infected: false,
            infected_packages: Vec::new(),
            analyzed: false,
        }
    }

    /// Record matched packages. `is_infected` always mirrors whether the list
    /// is non-empty.
    pub fn record_infections(&mut self, packages: Vec<String>) {
        self.infected_packages.extend(packages);
        self.is_infected = !self.infected_packages.is_empty();
    }
}

/// Add `repository` to the usage set of `reference`, creating the entry on
/// first sight.
pub fn record_usage(usages: &mut UsageMap, reference: &str, repository: &str) {
    usages
        .entry(reference.to_string())
        .or_insert_with(|| ActionUsage::new(reference))
        .used_by_repositories
        .insert(repository.to_string());
}

/// The repository an action reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub owner: String,
    pub repo: String,
}

impl ActionRef {
    /// Resolve `owner/repo[/path]@ref` to its hosting repository.
    ///
    /// Local (`./path`) and container (`docker://image`) references are not
    /// backed by a repository and yield `None`, as does anything without two
    /// non-empty leading path segments.
    pub fn parse(reference: &str) -> Option<Self> {
        if reference.starts_with("./") || reference.starts_with("docker://") {
            return None;
        }

        let base = reference.split('@').next().unwrap_or(reference);
        let mut segments = base.split('/');
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
