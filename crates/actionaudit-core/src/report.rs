use crate::scanner::ScanResult;
use crate::usage::ActionUsage;
use serde::{Deserialize, Serialize};

/// Final audit result for one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub organization: String,
    pub generated_at: String,
    pub repositories_scanned: usize,
    pub actions: Vec<ActionUsage>,
    pub summary: AuditSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_actions: usize,
    pub npm_actions: usize,
    pub infected_actions: usize,
    pub affected_repositories: usize,
}

impl AuditReport {
    pub fn new(organization: &str, scan: ScanResult) -> Self {
        let actions: Vec<ActionUsage> = scan.usages.into_values().collect();
        let summary = AuditSummary::from_actions(&actions);

        Self {
            organization: organization.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            repositories_scanned: scan.repositories_scanned,
            actions,
            summary,
        }
    }

    pub fn infected(&self) -> impl Iterator<Item = &ActionUsage> {
        self.actions.iter().filter(|a| a.is_infected)
    }

    pub fn has_infections(&self) -> bool {
        self.summary.infected_actions > 0
    }
}

impl AuditSummary {
    fn from_actions(actions: &[ActionUsage]) -> Self {
        let infected: Vec<&ActionUsage> = actions.iter().filter(|a| a.is_infected).collect();
        let mut affected: Vec<&str> = infected
            .iter()
            .flat_map(|a| a.used_by_repositories.iter().map(String::as_str))
            .collect();
        affected.sort_unstable();
        affected.dedup();

        Self {
            total_actions: actions.len(),
            npm_actions: actions.iter().filter(|a| a.uses_npm).count(),
            infected_actions: infected.len(),
            affected_repositories: affected.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{record_usage, UsageMap};

    fn scan() -> ScanResult {
        let mut usages = UsageMap::new();
        record_usage(&mut usages, "actions/checkout@v4", "api");
        record_usage(&mut usages, "actor/action@v1", "api");
        record_usage(&mut usages, "actor/action@v1", "web");
        record_usage(&mut usages, "other/action@v2", "web");
        record_usage(&mut usages, "other/action@v2", "docs");

        let actor = usages.get_mut("actor/action@v1").unwrap();
        actor.uses_npm = true;
        actor.record_infections(vec!["left-pad@1.3.0".into()]);
        usages.get_mut("other/action@v2").unwrap().uses_npm = true;

        ScanResult {
            usages,
            repositories_scanned: 3,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = AuditReport::new("acme", scan());
        assert_eq!(
            report.summary,
            AuditSummary {
                total_actions: 3,
                npm_actions: 2,
                infected_actions: 1,
                affected_repositories: 2,
            }
        );
        assert!(report.has_infections());
        assert_eq!(report.infected().count(), 1);
    }

    #[test]
    fn test_clean_report() {
        let report = AuditReport::new("acme", ScanResult::default());
        assert!(!report.has_infections());
        assert_eq!(report.summary, AuditSummary::default());
    }

    #[test]
    fn test_json_omits_analyzed_flag() {
        let report = AuditReport::new("acme", scan());
        let json = serde_json::to_value(&report).unwrap();
        let first = &json["actions"][0];
        assert_eq!(first["reference"], "actions/checkout@v4");
        assert!(first.get("analyzed").is_none());
        assert_eq!(json["summary"]["infected_actions"], 1);
    }
}
