pub mod analyzer;
pub mod config;
pub mod lockfile;
pub mod providers;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod usage;
pub mod workflow;

pub use analyzer::analyze_actions;
pub use config::{load_config, AuditConfig};
pub use providers::github_api::GitHubClient;
pub use providers::{GitHubError, RepoSource};
pub use registry::{InfectedPackage, Registry};
pub use report::{AuditReport, AuditSummary};
pub use scanner::{scan_organization, ScanOptions, ScanResult};
pub use usage::{ActionRef, ActionUsage, UsageMap};
