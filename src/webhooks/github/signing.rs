use std::io;

use anyhow::anyhow;
use hmac::{Hmac, Mac, NewMac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request,
};
use sha2::Sha256;
use tracing::trace;
use url::form_urlencoded;

use crate::webhooks::github::GitHubSecret;

const X_GITHUB_SIGNATURE: &str = "X-Hub-Signature-256";
const PAYLOAD_FIELD: &str = "payload";

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn validate_signature(secret: &str, signature: &str, data: &[u8]) -> bool {
    trace!("validating signature...");

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(data);

    // GitHub puts a prefix in front of its hex SHA256
    let signature = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return false;
        }
    };

    match hex::decode(signature) {
        Ok(bytes) => mac.verify(&bytes).is_ok(),
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            false
        }
    }
}

/// The JSON payload of a GitHub webhook delivery.
///
/// GitHub posts either `application/x-www-form-urlencoded` bodies, with the JSON in the `payload`
/// field, or the JSON document itself. When a [`GitHubSecret`] is configured, the raw body must
/// also carry a valid signature.
pub struct GitHubPayload(pub String);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

#[rocket::async_trait]
impl<'r> FromData<'r> for GitHubPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        let size_limit = request.limits().get("form").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                return Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, e.into())),
        };

        if let Some(GitHubSecret(Some(secret))) = request.rocket().state::<GitHubSecret>() {
            let signatures = request
                .headers()
                .get(X_GITHUB_SIGNATURE)
                .collect::<Vec<_>>();
            if signatures.len() != 1 {
                trace!("couldn't locate {} header", X_GITHUB_SIGNATURE);
                return Outcome::Error((
                    Status::BadRequest,
                    anyhow!("request header needs exactly one signature"),
                ));
            }

            if !validate_signature(secret, signatures[0], &content) {
                trace!("signature validation failed, stopping here...");
                return Outcome::Error((Status::BadRequest, anyhow!("couldn't verify signature")));
            }
            trace!("validated GitHub payload");
        }

        let is_form = request
            .content_type()
            .map_or(false, |content_type| content_type.is_form());
        // not rejected here: a payload that isn't valid UTF-8 fails to decode during dispatch
        let payload = if is_form {
            form_payload(&content)
        } else {
            String::from_utf8_lossy(&content).into_owned()
        };

        Outcome::Success(GitHubPayload(payload))
    }
}

/// Value of the `payload` field of a form-encoded body, empty if there is none.
fn form_payload(body: &[u8]) -> String {
    form_urlencoded::parse(body)
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
