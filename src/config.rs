use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Command used to run the Keybase CLI
    #[serde(default = "default_keybase_location")]
    pub keybase_location: String,
    /// Channel, inside the destination team, where messages are posted
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Address the webhook endpoint listens on
    #[serde(default = "default_address")]
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret configured on the GitHub webhook. When set, payloads without a valid
    /// `X-Hub-Signature-256` are refused.
    pub github_secret: Option<String>,
}

fn default_keybase_location() -> String {
    "keybase".to_string()
}

fn default_channel() -> String {
    "github".to_string()
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}
