use std::convert::Infallible;

use rocket::{
    request::{FromRequest, Outcome},
    Request, State,
};
use tracing::debug;

use crate::relay::{InboundEvent, Relay};

mod events;
pub use events::*;

mod signing;
pub use signing::GitHubPayload;

const X_GITHUB_EVENT: &str = "X-GitHub-Event";

/// Secret used to check the signature of incoming payloads, if any.
pub struct GitHubSecret(pub Option<String>);

/// Answers `OK` to every request it gets to handle: what happens to the event is none of the
/// webhook sender's business.
#[rocket::post("/?<team>", data = "<payload>")]
pub async fn github_webhook(
    team: Option<&str>,
    event: GitHubEventType<'_>,
    payload: GitHubPayload,
    relay: &State<Relay>,
) -> &'static str {
    debug!("received {:?} event for team {:?}", event.0, team);

    relay
        .dispatch(InboundEvent {
            destination: team,
            event_type: event.0.unwrap_or_default(),
            payload: &payload.0,
        })
        .await;

    "OK"
}

/// Value of the `X-GitHub-Event` header, if there is exactly one.
pub struct GitHubEventType<'r>(pub Option<&'r str>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GitHubEventType<'r> {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let event_types = request.headers().get(X_GITHUB_EVENT).collect::<Vec<_>>();
        if event_types.len() != 1 {
            debug!("request header needs exactly one event type");
            return Outcome::Success(GitHubEventType(None));
        }

        Outcome::Success(GitHubEventType(Some(event_types[0])))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hmac::{Mac, NewMac};
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        routes,
    };

    use super::*;
    use crate::relay::tests::{push_payload, RecordingSender};

    async fn client(secret: Option<&str>) -> (Client, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::default());
        let rocket = rocket::build()
            .mount("/", routes![github_webhook])
            .manage(Relay::new(sender.clone()))
            .manage(GitHubSecret(secret.map(str::to_string)));

        let client = Client::tracked(rocket).await.expect("valid rocket instance");
        (client, sender)
    }

    fn form_body(payload: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", payload)
            .finish()
    }

    fn sign(secret: &str, body: &str) -> String {
        let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[rocket::async_test]
    async fn test_form_encoded_push() {
        let (client, sender) = client(None).await;

        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(form_body(&push_payload()))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.as_deref(), Some("OK"));
        assert_eq!(
            sender.sent(),
            [(
                "acme".to_string(),
                "*github* [acme/widget] _ana_ pushed 1 commit to `main`\n>`abcdef12` Fix bug - ana"
                    .to_string()
            )]
        );
    }

    #[rocket::async_test]
    async fn test_json_body() {
        let (client, sender) = client(None).await;

        let response = client
            .post("/?team=acme")
            .header(ContentType::JSON)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(push_payload())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(sender.sent().len(), 1);
    }

    #[rocket::async_test]
    async fn test_dropped_requests_still_answer_ok() {
        let (client, sender) = client(None).await;
        let body = form_body(&push_payload());

        // no team
        let response = client
            .post("/")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // empty team
        let response = client
            .post("/?team=")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // unsupported event type
        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "pull_request"))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // no event type
        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // no payload field
        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body("foo=bar")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        assert!(sender.sent().is_empty());
    }

    #[rocket::async_test]
    async fn test_non_utf8_body_answers_ok() {
        let (client, sender) = client(None).await;
        let body: &[u8] = &[0xff, 0xfe, b'{'];

        let response = client
            .post("/?team=acme")
            .header(ContentType::JSON)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.as_deref(), Some("OK"));

        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(b"payload=%FF%FE%7B")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        assert!(sender.sent().is_empty());
    }

    #[rocket::async_test]
    async fn test_signature() {
        let (client, sender) = client(Some("hunter2")).await;
        let body = form_body(&push_payload());

        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .header(Header::new("X-Hub-Signature-256", sign("not the secret", &body)))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert!(sender.sent().is_empty());

        let response = client
            .post("/?team=acme")
            .header(ContentType::Form)
            .header(Header::new(X_GITHUB_EVENT, "push"))
            .header(Header::new("X-Hub-Signature-256", sign("hunter2", &body)))
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(sender.sent().len(), 1);
    }
}
