//! Blocking HTTP wrapper around the Whisper API.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{SecretRecord, SecretRequest, SecretToken, ServerStatus};
use crate::encoding::Credential;
use crate::error::{Result, WhisperError};

const USER_AGENT: &str = concat!("whisper/", env!("CARGO_PKG_VERSION"));

/// The four calls the UI flows make against the secret service.
pub trait SecretService {
    fn create_secret(&self, request: &SecretRequest) -> Result<SecretToken>;

    /// Fetch a secret; `credential` is sent as `Authorization: Bearer`.
    fn get_secret(&self, token: &str, credential: Option<&Credential>) -> Result<SecretRecord>;

    fn delete_secret(&self, token: &str, credential: Option<&Credential>) -> Result<()>;

    fn get_status(&self) -> Result<ServerStatus>;
}

/// Client bound to a single API base URL, e.g. `http://localhost:8318/v1`.
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: &str, path: &str, credential: Option<&Credential>) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT);
        match credential {
            Some(credential) => request.set("Authorization", &credential.bearer()),
            None => request,
        }
    }
}

fn secret_path(token: &str) -> String {
    format!("/secrets/{}", token.trim())
}

/// Turn a ureq outcome into a response or a classified error.
fn check(result: std::result::Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(WhisperError::from_status(status, &body))
        }
        Err(ureq::Error::Transport(transport)) => Err(WhisperError::Network(transport.to_string())),
    }
}

fn parse<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json()
        .map_err(|e| WhisperError::Decode(e.to_string()))
}

impl SecretService for Client {
    fn create_secret(&self, request: &SecretRequest) -> Result<SecretToken> {
        debug!(
            lifetime = %request.lifetime,
            accesses = %request.accesses,
            is_base64 = request.is_base64,
            "creating secret"
        );
        let response = check(self.request("POST", "/secrets", None).send_json(request))?;
        parse(response)
    }

    fn get_secret(&self, token: &str, credential: Option<&Credential>) -> Result<SecretRecord> {
        debug!(authorization = credential.is_some(), "fetching secret");
        let response = check(self.request("GET", &secret_path(token), credential).call())?;
        parse(response)
    }

    fn delete_secret(&self, token: &str, credential: Option<&Credential>) -> Result<()> {
        debug!(authorization = credential.is_some(), "destroying secret");
        check(self.request("DELETE", &secret_path(token), credential).call())?;
        Ok(())
    }

    fn get_status(&self) -> Result<ServerStatus> {
        // 503 still carries a status body (maintenance, unhealthy, not ready)
        match self.request("GET", "/status", None).call() {
            Ok(response) | Err(ureq::Error::Status(503, response)) => parse(response),
            other => check(other).and_then(parse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AccessLimit, Lifetime, SecretPayload, ServiceState};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = Client::new("http://localhost:8318/v1/");
        assert_eq!(client.base_url(), "http://localhost:8318/v1");
    }

    #[test]
    fn secret_path_trims_token() {
        assert_eq!(secret_path(" abc123 "), "/secrets/abc123");
    }

    #[test]
    fn unreachable_server_is_a_network_error() {
        // port 9 (discard) is closed on test machines
        let client = Client::new("http://127.0.0.1:9/v1");
        assert!(matches!(
            client.get_secret("abc", None),
            Err(WhisperError::Network(_))
        ));
    }

    fn client_for(server: &MockServer) -> Client {
        Client::new(&format!("{}/v1", server.uri()))
    }

    // ureq blocks, so keep it off the runtime threads serving the mock
    async fn blocking<T, F>(call: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(call).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_sends_bearer_credential() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/secrets/abc"))
            .and(header("Authorization", "Bearer cEBzcw=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let credential = Credential::from_password("p@ss");
        let result = blocking(move || client.delete_secret("abc", Some(&credential))).await;
        assert!(result.is_ok(), "delete failed: {result:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_without_credential_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secrets/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secret": "hello",
                "is_base64": false,
                "created": "2024-03-01T12:30:00Z",
                "accesses": 1,
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let record = blocking(move || client.get_secret("abc", None)).await.unwrap();
        assert_eq!(record.secret, "hello");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_maps_401_and_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secrets/locked"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"success": false, "error": "unauthorized"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/secrets/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"success": false, "error": "not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (locked, gone) = blocking(move || {
            (
                client.get_secret("locked", None),
                client.get_secret("gone", None),
            )
        })
        .await;
        assert!(matches!(locked, Err(WhisperError::Unauthorized)));
        assert!(matches!(gone, Err(WhisperError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_503_body_is_a_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/status"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"status": "maintenance", "version": "1.2.0"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let status = blocking(move || client.get_status()).await.unwrap();
        assert_eq!(status.status, ServiceState::Maintenance);
        assert_eq!(status.version.as_deref(), Some("1.2.0"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_posts_request_and_parses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secrets"))
            .and(body_json(json!({
                "secret": "the eagle flies at midnight",
                "accesses": 1,
                "lifetime": "168h",
                "is_base64": false,
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": "tok123",
                "expires": "2099-01-08T12:00:00Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = SecretRequest::new(
            SecretPayload::Text("the eagle flies at midnight".to_string()),
            None,
            AccessLimit::limited(1),
            Lifetime::SevenDays,
        );
        let token = blocking(move || client.create_secret(&request)).await.unwrap();
        assert_eq!(token.token, "tok123");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_rejection_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secrets"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"success": false, "error": "invalid create secret request"}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = SecretRequest::new(
            SecretPayload::Text("x".to_string()),
            None,
            AccessLimit::Unlimited,
            Lifetime::default(),
        );
        let err = blocking(move || client.create_secret(&request))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "[400] invalid create secret request");
    }
}
