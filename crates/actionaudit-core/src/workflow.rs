use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Directory holding a repository's GitHub Actions workflows.
pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// The part of a workflow document needed to find action references.
#[derive(Debug, Default, Deserialize)]
struct Workflow {
    #[serde(default)]
    jobs: Option<BTreeMap<String, Job>>,
}

#[derive(Debug, Default, Deserialize)]
struct Job {
    #[serde(default)]
    steps: Option<Vec<Step>>,
}

#[derive(Debug, Default, Deserialize)]
struct Step {
    #[serde(default)]
    uses: Option<String>,
}

/// Whether a directory entry name looks like a workflow file.
pub fn is_workflow_file_name(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}

/// Collect the `uses:` value of every step of every job, in document order
/// within a job. Job-level `uses:` (reusable workflows) is not collected.
pub fn extract_action_references(content: &str) -> Result<Vec<String>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let workflow: Workflow =
        serde_yaml::from_str(content).context("Failed to parse workflow YAML")?;

    let references = workflow
        .jobs
        .unwrap_or_default()
        .into_values()
        .flat_map(|job| job.steps.unwrap_or_default())
        .filter_map(|step| step.uses)
        .collect();

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_step_uses() {
        let yaml = r#"
name: CI
on: [push]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Setup
        uses: actions/setup-node@v4
        with:
          node-version: 20
      - run: npm test
  lint:
    steps:
      - uses: actor/action@v1
"#;
        let refs = extract_action_references(yaml).unwrap();
        assert_eq!(
            refs,
            vec!["actions/checkout@v4", "actions/setup-node@v4", "actor/action@v1"]
        );
    }

    #[test]
    fn test_missing_jobs_yields_nothing() {
        let refs = extract_action_references("name: Empty\non: push\n").unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_job_without_steps_is_skipped() {
        let yaml = r#"
jobs:
  call:
    uses: org/shared/.github/workflows/build.yml@main
  test:
    steps:
      - uses: actions/cache@v4
"#;
        let refs = extract_action_references(yaml).unwrap();
        assert_eq!(refs, vec!["actions/cache@v4"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_action_references("").unwrap().is_empty());
        assert!(extract_action_references("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(extract_action_references("jobs: [unclosed").is_err());
    }

    #[test]
    fn test_unexpected_shape_is_an_error() {
        assert!(extract_action_references("jobs:\n  build:\n    steps: not-a-list\n").is_err());
    }

    #[test]
    fn test_workflow_file_names() {
        assert!(is_workflow_file_name("ci.yml"));
        assert!(is_workflow_file_name("release.yaml"));
        assert!(!is_workflow_file_name("README.md"));
        assert!(!is_workflow_file_name("ci.yml.bak"));
    }
}
