use serde::Deserialize;

mod issues;
mod push;

pub use issues::*;
pub use push::*;

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub full_name: String,
}
