use crate::lockfile::{PackageLock, PACKAGE_LOCK_FILE, PACKAGE_MANIFEST_FILE};
use crate::providers::RepoSource;
use crate::registry::Registry;
use crate::usage::{ActionRef, ActionUsage, UsageMap};
use tracing::{debug, info, warn};

/// Resolve the npm footprint of every action not yet analyzed.
///
/// Each entry is attempted once: it is marked analyzed afterwards whether or
/// not its repository could be resolved or read.
pub async fn analyze_actions<S>(source: &S, usages: &mut UsageMap, registry: &Registry)
where
    S: RepoSource + ?Sized,
{
    info!("Analyzing actions...");

    for usage in usages.values_mut().filter(|u| !u.analyzed) {
        match ActionRef::parse(&usage.reference) {
            Some(action) => analyze_action(source, &action, usage, registry).await,
            None => debug!(reference = %usage.reference, "not a repository-backed action"),
        }
        usage.analyzed = true;
    }
}

/// Check one action repository: the lockfile when present, otherwise only
/// whether a `package.json` exists.
///
/// A repository with `package.json` and no lockfile is reported as using npm
/// but is never checked for infection, since no resolved versions exist.
pub async fn analyze_action<S>(
    source: &S,
    action: &ActionRef,
    usage: &mut ActionUsage,
    registry: &Registry,
) where
    S: RepoSource + ?Sized,
{
    let full_name = action.full_name();
    info!("Analyzing {}...", full_name);

    let lock_content = match source
        .get_file(&action.owner, &action.repo, PACKAGE_LOCK_FILE)
        .await
    {
        Ok(content) => content,
        Err(e) => {
            debug!(action = %full_name, error = %e, "no usable package-lock.json");
            check_manifest(source, action, usage).await;
            return;
        }
    };

    usage.uses_npm = true;
    info!("  Found {} for {}", PACKAGE_LOCK_FILE, full_name);

    let lock = match PackageLock::parse(&lock_content) {
        Ok(lock) => lock,
        Err(e) => {
            warn!("  Error parsing {} for {}: {:#}", PACKAGE_LOCK_FILE, full_name, e);
            return;
        }
    };

    let infected = lock.find_infected(registry);
    if !infected.is_empty() {
        warn!(
            "  INFECTED with {} packages: [{}]",
            infected.len(),
            infected.join(", ")
        );
    }
    usage.record_infections(infected);
}

async fn check_manifest<S>(source: &S, action: &ActionRef, usage: &mut ActionUsage)
where
    S: RepoSource + ?Sized,
{
    match source
        .get_file(&action.owner, &action.repo, PACKAGE_MANIFEST_FILE)
        .await
    {
        Ok(_) => {
            usage.uses_npm = true;
            info!(
                "  Found {} (no lock file) for {}",
                PACKAGE_MANIFEST_FILE,
                action.full_name()
            );
        }
        Err(_) => info!(
            "  No {} or {} found for {}",
            PACKAGE_MANIFEST_FILE,
            PACKAGE_LOCK_FILE,
            action.full_name()
        ),
    }
}
