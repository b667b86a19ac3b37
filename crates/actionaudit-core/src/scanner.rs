use crate::providers::{ContentEntry, RepoSource};
use crate::usage::{record_usage, UsageMap};
use crate::workflow::{extract_action_references, is_workflow_file_name, WORKFLOWS_DIR};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// How the organization is walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Stop after this many repositories. `None` scans everything.
    pub max_repos: Option<usize>,
    pub per_page: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_repos: None,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ScanOptions {
    fn cap_reached(&self, scanned: usize) -> bool {
        self.max_repos.is_some_and(|max| scanned >= max)
    }
}

/// Action usage collected from an organization's workflows.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub usages: UsageMap,
    pub repositories_scanned: usize,
}

/// Walk every repository of `org` and collect the actions its workflows use.
///
/// Only a failure to list the organization itself is returned as an error;
/// anything scoped to one repository or file is logged and skipped.
pub async fn scan_organization<S>(source: &S, org: &str, options: &ScanOptions) -> Result<ScanResult>
where
    S: RepoSource + ?Sized,
{
    let mut result = ScanResult::default();
    let mut page = 1;

    'pages: loop {
        let repos = source
            .list_org_repositories(org, page, options.per_page)
            .await
            .with_context(|| format!("Failed to list repositories of organization '{}'", org))?;
        let page_len = repos.len();

        for repo in repos {
            if options.cap_reached(result.repositories_scanned) {
                info!(
                    "Reached maximum of {} repositories.",
                    options.max_repos.unwrap_or_default()
                );
                break 'pages;
            }

            match options.max_repos {
                Some(max) => info!(
                    "Processing repository {}/{}: {}",
                    result.repositories_scanned + 1,
                    max,
                    repo.name
                ),
                None => info!("Processing repository: {}", repo.name),
            }
            result.repositories_scanned += 1;

            scan_repository(source, org, &repo.name, &mut result.usages).await;
        }

        if options.cap_reached(result.repositories_scanned) || page_len < options.per_page as usize
        {
            break;
        }
        page += 1;
    }

    Ok(result)
}

/// Record the actions used by one repository's workflows.
pub async fn scan_repository<S>(source: &S, org: &str, repo: &str, usages: &mut UsageMap)
where
    S: RepoSource + ?Sized,
{
    let entries = match source.list_directory(org, repo, WORKFLOWS_DIR).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => {
            debug!(repo, "no workflows directory");
            return;
        }
        Err(e) => {
            warn!("Error listing {} in {}: {}", WORKFLOWS_DIR, repo, e);
            return;
        }
    };

    for entry in entries.iter().filter(|e| is_workflow_entry(e)) {
        let content = match source.get_file(org, repo, &entry.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Error getting file {} in {}: {}", entry.path, repo, e);
                continue;
            }
        };

        match extract_action_references(&content) {
            Ok(references) => {
                for reference in references {
                    record_usage(usages, &reference, repo);
                }
            }
            Err(e) => warn!("Skipping {} in {}: {:#}", entry.path, repo, e),
        }
    }
}

fn is_workflow_entry(entry: &ContentEntry) -> bool {
    entry.is_file() && is_workflow_file_name(&entry.name)
}
