use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rocket::routes;

mod chat;
use chat::KeybaseClient;

mod config;
use config::RelayConfig;

mod relay;
use relay::Relay;

mod webhooks;
use webhooks::{github_webhook, GitHubSecret};

#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Configuration file for the relay
    #[clap(short, long, parse(from_os_str))]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: RelayConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;

    let keybase = KeybaseClient::new(&config);
    keybase
        .init()
        .await
        .context("failed to init keybase client")?;
    let relay = Relay::new(Arc::new(keybase));

    let figment = rocket::Config::figment()
        .merge(("address", config.address))
        .merge(("port", config.port));

    let rocket = rocket::custom(figment)
        .mount("/", routes![github_webhook])
        .manage(relay)
        .manage(GitHubSecret(config.github_secret));
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err))
}
