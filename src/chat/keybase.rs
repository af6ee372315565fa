use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::{chat::MessageSender, config::RelayConfig};

/// Sends messages through the Keybase CLI's JSON chat API.
pub struct KeybaseClient {
    keybase_location: String,
    channel: String,
}

impl KeybaseClient {
    /// Creates a client posting to the configured channel of each team.
    ///
    /// Nothing is run yet, see [`KeybaseClient::init`].
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            keybase_location: config.keybase_location.clone(),
            channel: config.channel.clone(),
        }
    }

    /// Checks that the Keybase CLI can be run and is logged in.
    pub async fn init(&self) -> anyhow::Result<()> {
        let output = Command::new(&self.keybase_location)
            .args(["whoami", "--json"])
            .output()
            .await
            .with_context(|| format!("couldn't run `{}`", self.keybase_location))?;

        if !output.status.success() {
            bail!(
                "`{} whoami` failed: {}",
                self.keybase_location,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let username = parse_username(&output.stdout)?;
        info!("logged in to keybase as {}", username);

        Ok(())
    }
}

#[rocket::async_trait]
impl MessageSender for KeybaseClient {
    async fn send_message(&self, destination: &str, message: &str) -> anyhow::Result<()> {
        let request = send_request(destination, &self.channel, message).to_string();
        trace!("keybase chat api request: {}", request);

        let output = Command::new(&self.keybase_location)
            .args(["chat", "api", "-m", request.as_str()])
            .output()
            .await
            .with_context(|| format!("couldn't run `{} chat api`", self.keybase_location))?;

        if !output.status.success() && output.stdout.is_empty() {
            bail!(
                "`{} chat api` exited with {}: {}",
                self.keybase_location,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        check_reply(&output.stdout)?;
        if !output.status.success() {
            bail!(
                "`{} chat api` exited with {}",
                self.keybase_location,
                output.status
            );
        }
        debug!("message sent to {}#{}", destination, self.channel);

        Ok(())
    }
}

fn send_request(team: &str, channel: &str, body: &str) -> Value {
    json!({
        "method": "send",
        "params": {
            "options": {
                "channel": {
                    "name": team,
                    "members_type": "team",
                    "topic_name": channel,
                },
                "message": { "body": body },
            },
        },
    })
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    message: String,
}

fn check_reply(stdout: &[u8]) -> anyhow::Result<()> {
    let reply: ApiReply =
        serde_json::from_slice(stdout).context("couldn't parse keybase chat api reply")?;

    match reply.error {
        Some(ApiError { code, message }) => Err(anyhow!(
            "keybase chat api error {}: {}",
            code,
            message
        )),
        None => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct WhoAmI {
    user: Option<WhoAmIUser>,
}

#[derive(Debug, Deserialize)]
struct WhoAmIUser {
    username: String,
}

fn parse_username(stdout: &[u8]) -> anyhow::Result<String> {
    let whoami: WhoAmI =
        serde_json::from_slice(stdout).context("couldn't parse keybase whoami output")?;

    whoami
        .user
        .map(|user| user.username)
        .filter(|username| !username.is_empty())
        .ok_or_else(|| anyhow!("unable to find Keybase username, is keybase logged in?"))
}
