use std::fmt::Write;

use thiserror::Error;
use tracing::trace;

use crate::{
    relay::{message_builder::MessageBuilder, utils::pluralize},
    webhooks::github::{IssuesEvent, PushEvent},
};

const TAG: &str = "github";
const OPENED: &str = "opened";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("couldn't decode payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("action `{0}` isn't announced")]
    UnreportableAction(String),
}

/// Turns the raw JSON payload of one GitHub event type into a chat message.
pub trait EventFormatter: Send + Sync {
    /// Value of the `X-GitHub-Event` header this formatter handles.
    fn event_type(&self) -> &'static str;

    fn try_format(&self, payload: &str) -> Result<String, FormatError>;
}

pub struct PushFormatter;

impl EventFormatter for PushFormatter {
    fn event_type(&self) -> &'static str {
        "push"
    }

    fn try_format(&self, payload: &str) -> Result<String, FormatError> {
        let event: PushEvent = serde_json::from_str(payload)?;
        Ok(format_push(&event))
    }
}

fn format_push(event: &PushEvent) -> String {
    trace!("formatting push to {}", event.r#ref);
    let mut message = header(&event.repository.full_name);

    message.italic();
    write!(message, "{}", event.pusher.name).unwrap();
    message.close_last();

    if event.is_deletion() {
        write!(message, " deleted branch ").unwrap();
        code(&mut message, event.branch());
        return message.build();
    }

    write!(
        message,
        " pushed {} to ",
        pluralize(event.commits.len(), "commit")
    )
    .unwrap();
    code(&mut message, event.branch());

    for commit in &event.commits {
        message.quote_line();
        code(&mut message, commit.short_id());
        write!(message, " {} - {}", commit.title(), event.author_of(commit)).unwrap();
    }

    message.build()
}

pub struct IssuesFormatter;

impl EventFormatter for IssuesFormatter {
    fn event_type(&self) -> &'static str {
        "issues"
    }

    fn try_format(&self, payload: &str) -> Result<String, FormatError> {
        let event: IssuesEvent = serde_json::from_str(payload)?;
        if event.action != OPENED {
            return Err(FormatError::UnreportableAction(event.action));
        }
        Ok(format_issue_opened(&event))
    }
}

fn format_issue_opened(event: &IssuesEvent) -> String {
    let issue = &event.issue;
    trace!("formatting issue #{}", issue.number);
    let mut message = header(&event.repository.full_name);

    write!(message, "Issue created by ").unwrap();
    message.italic();
    write!(message, "{}", issue.user.login).unwrap();

    message.quote_line();
    message.bold();
    write!(message, "[#{}] {}", issue.number, issue.title).unwrap();

    message.quote_line();
    write!(message, "{}", issue.html_url).unwrap();

    message.quote_line();
    message.quote_block(issue.body.as_deref().unwrap_or_default());

    message.build()
}

/// `*github* [owner/repo] `
fn header(repository: &str) -> MessageBuilder {
    let mut message = MessageBuilder::new();
    message.tag(TAG);
    write!(message, " [{}] ", repository).unwrap();
    message
}

fn code(message: &mut MessageBuilder, text: &str) {
    message.code();
    write!(message, "{}", text).unwrap();
    message.close_last();
}
