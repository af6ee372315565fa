mod keybase;
pub use keybase::KeybaseClient;

/// Something able to post a text message to a team.
#[rocket::async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, destination: &str, message: &str) -> anyhow::Result<()>;
}
