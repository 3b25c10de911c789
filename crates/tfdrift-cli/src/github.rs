use std::collections::BTreeMap;
use std::time::Duration;

use tfdrift_core::ValidationFinding;

const GITHUB_API_BASE: &str = "https://api.github.com";
const ISSUE_TITLE: &str = "Generated schema validation";

/// Mirrors validation findings into a single GitHub issue on the repository,
/// creating it on first sync and rewriting its body on subsequent ones.
pub struct GitHubIssueManager {
    owner: String,
    repo: String,
    token: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct Issue {
    number: u64,
    title: String,
}

impl GitHubIssueManager {
    pub fn new(owner: String, repo: String, token: String) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("unable to build http client: {e}"))?;
        Ok(GitHubIssueManager { owner, repo, token, client })
    }

    /// Repository coordinates come from the flags when provided, then from
    /// the environment GitHub Actions populates: `GITHUB_REPOSITORY`
    /// (`owner/name`) or the `GITHUB_REPOSITORY_OWNER` and
    /// `GITHUB_REPOSITORY_NAME` pair. The token always comes from
    /// `GITHUB_TOKEN`.
    pub fn from_env(owner: Option<String>, repo: Option<String>) -> Result<Self, String> {
        let token = env_value("GITHUB_TOKEN")
            .ok_or_else(|| "GITHUB_TOKEN is required to manage issues".to_string())?;

        let split = env_value("GITHUB_REPOSITORY").and_then(|v| {
            v.split_once('/').map(|(owner, name)| (owner.to_string(), name.to_string()))
        });

        let owner = owner
            .or_else(|| env_value("GITHUB_REPOSITORY_OWNER"))
            .or_else(|| split.as_ref().map(|(owner, _)| owner.clone()))
            .ok_or_else(|| "unable to determine github repository owner".to_string())?;
        let repo = repo
            .or_else(|| env_value("GITHUB_REPOSITORY_NAME"))
            .or_else(|| split.as_ref().map(|(_, name)| name.clone()))
            .ok_or_else(|| "unable to determine github repository name".to_string())?;

        Self::new(owner, repo, token)
    }

    /// Creates or updates the tracking issue. A run with no findings closes
    /// the issue if one is open.
    pub fn sync(&self, findings: &[ValidationFinding]) -> Result<(), String> {
        let existing = self.find_existing_issue()?;

        if findings.is_empty() {
            return match existing {
                Some(number) => self.close_issue(number),
                None => Ok(()),
            };
        }

        let body = markdown_body(findings);
        match existing {
            Some(number) => self.update_issue(number, &body),
            None => self.create_issue(&body),
        }
    }

    fn find_existing_issue(&self) -> Result<Option<u64>, String> {
        let url = format!(
            "{GITHUB_API_BASE}/repos/{}/{}/issues?state=open",
            self.owner, self.repo
        );
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "tfdrift")
            .send()
            .map_err(|e| format!("github request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(github_api_error(response));
        }

        let issues: Vec<Issue> =
            response.json().map_err(|e| format!("unable to decode issue list: {e}"))?;
        Ok(issues.into_iter().find(|issue| issue.title == ISSUE_TITLE).map(|issue| issue.number))
    }

    fn update_issue(&self, number: u64, body: &str) -> Result<(), String> {
        let url = format!(
            "{GITHUB_API_BASE}/repos/{}/{}/issues/{number}",
            self.owner, self.repo
        );
        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "tfdrift")
            .json(&serde_json::json!({ "body": body }))
            .send()
            .map_err(|e| format!("github request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(github_api_error(response));
        }
        Ok(())
    }

    fn close_issue(&self, number: u64) -> Result<(), String> {
        let url = format!(
            "{GITHUB_API_BASE}/repos/{}/{}/issues/{number}",
            self.owner, self.repo
        );
        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "tfdrift")
            .json(&serde_json::json!({ "state": "closed" }))
            .send()
            .map_err(|e| format!("github request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(github_api_error(response));
        }
        Ok(())
    }

    fn create_issue(&self, body: &str) -> Result<(), String> {
        let url = format!("{GITHUB_API_BASE}/repos/{}/{}/issues", self.owner, self.repo);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "tfdrift")
            .json(&serde_json::json!({ "title": ISSUE_TITLE, "body": body }))
            .send()
            .map_err(|e| format!("github request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(github_api_error(response));
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn github_api_error(response: reqwest::blocking::Response) -> String {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    format!("github api error: {status}, response: {body}")
}

/// Renders the issue body, one markdown line per distinct finding. A
/// `BTreeMap` keyed on the finding identity both deduplicates and gives the
/// body a stable ordering, so re-syncing the same findings never churns the
/// issue.
fn markdown_body(findings: &[ValidationFinding]) -> String {
    let mut lines = BTreeMap::new();
    for finding in findings {
        let clean_path = finding.path.strip_prefix("root.").unwrap_or(&finding.path);
        let requirement = if finding.required { "required" } else { "optional" };
        let kind = if finding.is_block { "block" } else { "property" };
        let entity = if finding.is_data_source { "data source" } else { "resource" };

        let key = format!(
            "{}|{}|{}|{}|{}|{}",
            finding.resource_type,
            clean_path,
            finding.name,
            finding.is_block,
            finding.is_data_source,
            finding.submodule_name
        );
        let line = if finding.submodule_name.is_empty() {
            format!(
                "`{}`: missing {} {} `{}` in `{}` ({})\n\n",
                finding.resource_type, requirement, kind, finding.name, clean_path, entity
            )
        } else {
            format!(
                "`{}`: missing {} {} `{}` in `{}` in submodule `{}` ({})\n\n",
                finding.resource_type,
                requirement,
                kind,
                finding.name,
                clean_path,
                finding.submodule_name,
                entity
            )
        };
        lines.insert(key, line);
    }
    lines.into_values().collect()
}
