use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::chat::MessageSender;

mod github;
pub use github::{EventFormatter, FormatError, IssuesFormatter, PushFormatter};

mod message_builder;

pub(crate) mod utils;

/// A webhook delivery, as handed over by the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct InboundEvent<'a> {
    /// Team the message should be sent to, from the `team` query parameter.
    pub destination: Option<&'a str>,
    /// Value of the `X-GitHub-Event` header.
    pub event_type: &'a str,
    /// JSON payload of the event.
    pub payload: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub destination: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no destination specified")]
    MissingDestination,
    #[error("unsupported event type: `{0}`")]
    UnsupportedEvent(String),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl DispatchError {
    /// Conditions that happen all the time on a public endpoint and aren't worth a warning.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::MissingDestination | Self::Format(FormatError::UnreportableAction(_))
        )
    }
}

/// Routes webhook payloads to the formatter registered for their event type, and sends the
/// resulting message.
pub struct Relay {
    formatters: HashMap<&'static str, Box<dyn EventFormatter>>,
    sender: Arc<dyn MessageSender>,
}

impl Relay {
    /// Creates a [`Relay`] handling `push` and `issues` events.
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self {
            formatters: HashMap::new(),
            sender,
        }
        .with_formatter(PushFormatter)
        .with_formatter(IssuesFormatter)
    }

    /// Registers `formatter` for its event type, replacing any previous one.
    pub fn with_formatter(mut self, formatter: impl EventFormatter + 'static) -> Self {
        self.formatters
            .insert(formatter.event_type(), Box::new(formatter));
        self
    }

    /// Builds the message for `event` without sending it.
    pub fn render(&self, event: &InboundEvent) -> Result<OutgoingMessage, DispatchError> {
        let destination = match event.destination {
            Some(destination) if !destination.is_empty() => destination,
            _ => return Err(DispatchError::MissingDestination),
        };

        let formatter = self
            .formatters
            .get(event.event_type)
            .ok_or_else(|| DispatchError::UnsupportedEvent(event.event_type.to_string()))?;

        let text = formatter.try_format(event.payload)?;

        Ok(OutgoingMessage {
            destination: destination.to_string(),
            text,
        })
    }

    /// Renders `event` and sends it.
    ///
    /// Failures are only logged: the webhook sender gets the same answer whatever happens here.
    pub async fn dispatch(&self, event: InboundEvent<'_>) {
        let OutgoingMessage { destination, text } = match self.render(&event) {
            Ok(message) => message,
            Err(e) if e.is_expected() => {
                match e {
                    DispatchError::MissingDestination => {
                        info!("invalid request, no team name specified")
                    }
                    _ => debug!("`{}` event wasn't announced: {}", event.event_type, e),
                }
                return;
            }
            Err(e) => {
                warn!("error handling hook event: {}", e);
                return;
            }
        };

        trace!("sending message `{}` to team `{}`", text, destination);
        match self.sender.send_message(&destination, &text).await {
            Ok(()) => info!("sent `{}` event to team `{}`", event.event_type, destination),
            Err(e) => warn!("failed to send message to team `{}`: {:#}", destination, e),
        }
    }
}
