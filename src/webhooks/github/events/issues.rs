use serde::Deserialize;

use crate::webhooks::github::events::{GitHubUser, Repository};

#[derive(Debug, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    // echoed as received, not normalized
    pub html_url: String,
    pub title: String,
    // GitHub sends `null` for issues created without a description
    pub body: Option<String>,
    pub user: GitHubUser,
}
