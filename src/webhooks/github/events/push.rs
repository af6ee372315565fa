use serde::Deserialize;

use crate::webhooks::github::events::Repository;

const BRANCH_PREFIX: &str = "refs/heads/";
const SHORT_ID_LENGTH: usize = 8;

/// Payload of a `push` event.
///
/// Only `ref`, `pusher.name` and `repository.full_name` are required. The per-commit author and
/// committer are optional, so the reduced pusher-only payload decodes into the same shape.
#[derive(Debug, Deserialize)]
pub struct PushEvent {
    pub r#ref: String,
    pub pusher: Pusher,
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

impl PushEvent {
    /// Branch name, with the `refs/heads/` prefix removed when present.
    pub fn branch(&self) -> &str {
        self.r#ref
            .strip_prefix(BRANCH_PREFIX)
            .unwrap_or(&self.r#ref)
    }

    /// An empty commit list means the branch was deleted.
    pub fn is_deletion(&self) -> bool {
        self.commits.is_empty()
    }

    /// Display name for a commit's author, falling back to the committer, then to the pusher.
    pub fn author_of<'a>(&'a self, commit: &'a Commit) -> &'a str {
        commit
            .author
            .as_ref()
            .or(commit.committer.as_ref())
            .map_or(&self.pusher.name, |user| &user.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct Pusher {
    pub name: String,
    #[allow(dead_code)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub author: Option<CommitUser>,
    pub committer: Option<CommitUser>,
}

impl Commit {
    /// First line of the commit message.
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// The first 8 characters of the commit id, or the whole id if it is shorter.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LENGTH) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommitUser {
    pub name: String,
    #[allow(dead_code)]
    pub email: Option<String>,
}
