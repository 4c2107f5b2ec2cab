//! Request clients used by workers
//!
//! Workers only see the [`RequestClient`] trait. [`HttpRequestClient`] talks to
//! the meter endpoint over HTTP; [`SimulatedClient`] just sleeps.
//!
//! The orchestrator asks a [`ClientFactory`] for one client per worker, so no
//! connection state is shared between workers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode};

use crate::error::{LoadError, LoadResult};

/// Path prefix of the usage endpoint; each worker appends `load_<id>`
pub const METER_PATH_BASE: &str = "/1.0/kb/meter/f36d5557-e1d9-427a-8133-9ea49aa7e0f8/visit/";

/// Basic credentials sent with every request (`bob:lazar`)
pub const BASIC_AUTHORIZATION: &str = "Basic Ym9iOmxhemFy";

/// Header identifying the caller to the server
pub const CREATED_BY_HEADER: &str = "X-Killbill-CreatedBy";

/// Value sent in [`CREATED_BY_HEADER`]
pub const CREATED_BY: &str = "meter_load_test";

/// The path a given worker posts to
pub fn worker_path(worker: usize) -> String {
    format!("{METER_PATH_BASE}load_{worker}")
}

/// A POST that did not complete with a success or redirect status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestFailure {
    /// The server answered outside the 2xx/3xx range
    #[error("{status}:{reason}\nMETHOD:{method}\nURI:{path}\n{body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Reason phrase
        reason: String,
        /// Request method
        method: String,
        /// Request path
        path: String,
        /// Response body
        body: String,
    },

    /// The request never produced a response
    #[error("transport error\nMETHOD:{method}\nURI:{path}\n{message}")]
    Transport {
        /// Request method
        method: String,
        /// Request path
        path: String,
        /// Underlying error
        message: String,
    },
}

impl RequestFailure {
    /// Build a status failure for a POST
    pub fn post_status(status: StatusCode, path: &str, body: String) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            method: "POST".to_string(),
            path: path.to_string(),
            body,
        }
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// Issues one request and reports whether it succeeded
///
/// Implementations must not retry: a retried call would distort the latency
/// sample.
#[async_trait]
pub trait RequestClient: Send + Sync {
    /// Client identifier used in logs
    fn name(&self) -> &str;

    /// POST to `path` with an empty body
    async fn post(&self, path: &str) -> Result<(), RequestFailure>;
}

/// HTTP client for the meter usage endpoint
#[derive(Debug, Clone)]
pub struct HttpRequestClient {
    client: Client,
    base_url: String,
}

impl HttpRequestClient {
    /// Create a client for `host:port`
    ///
    /// Redirects are not followed; a 3xx answer counts as success. Idle
    /// connections are not kept, so every timed POST includes connection
    /// setup.
    pub fn new(host: &str, port: u16) -> LoadResult<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LoadError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("http://{host}:{port}"),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RequestClient for HttpRequestClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn post(&self, path: &str) -> Result<(), RequestFailure> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, BASIC_AUTHORIZATION)
            .header(CREATED_BY_HEADER, CREATED_BY)
            .send()
            .await
            .map_err(|e| RequestFailure::Transport {
                method: "POST".to_string(),
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RequestFailure::post_status(status, path, body))
    }
}

/// Supplies the client each worker issues its requests through
pub trait ClientFactory: Send + Sync {
    /// Name of the clients handed out, used in logs
    fn name(&self) -> &str;

    /// Client for worker `worker` (1-based)
    fn client_for(&self, worker: usize) -> LoadResult<Arc<dyn RequestClient>>;
}

/// Builds a separate [`HttpRequestClient`] for every worker
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    host: String,
    port: u16,
}

impl HttpClientFactory {
    /// Factory for clients targeting `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn name(&self) -> &str {
        "http"
    }

    fn client_for(&self, _worker: usize) -> LoadResult<Arc<dyn RequestClient>> {
        Ok(Arc::new(HttpRequestClient::new(&self.host, self.port)?))
    }
}

/// Hands the same client to every worker
///
/// Only for clients without connection state, such as [`SimulatedClient`].
#[derive(Clone)]
pub struct SharedClient(Arc<dyn RequestClient>);

impl SharedClient {
    /// Wrap `client`
    pub fn new(client: Arc<dyn RequestClient>) -> Self {
        Self(client)
    }
}

impl ClientFactory for SharedClient {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn client_for(&self, _worker: usize) -> LoadResult<Arc<dyn RequestClient>> {
        Ok(Arc::clone(&self.0))
    }
}

impl std::fmt::Debug for SharedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedClient").field(&self.0.name()).finish()
    }
}

/// Client that sleeps for a random time in `[0, 3)` seconds instead of
/// calling a server
#[derive(Debug, Clone, Default)]
pub struct SimulatedClient;

impl SimulatedClient {
    /// Create a simulated client
    pub fn new() -> Self {
        Self
    }

    fn next_delay() -> Duration {
        let mut rng = rand::thread_rng();
        let secs = rng.gen::<f64>() + f64::from(rng.gen_range(0u8..=2));
        Duration::from_secs_f64(secs)
    }
}

#[async_trait]
impl RequestClient for SimulatedClient {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn post(&self, _path: &str) -> Result<(), RequestFailure> {
        tokio::time::sleep(Self::next_delay()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HttpRequestClient {
        let addr = server.address();
        HttpRequestClient::new(&addr.ip().to_string(), addr.port()).unwrap()
    }

    #[test]
    fn test_worker_path() {
        assert_eq!(
            worker_path(7),
            "/1.0/kb/meter/f36d5557-e1d9-427a-8133-9ea49aa7e0f8/visit/load_7"
        );
    }

    #[test]
    fn test_status_failure_display() {
        let failure = RequestFailure::post_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "/visit/load_1",
            "boom".to_string(),
        );
        assert_eq!(failure.status(), Some(500));
        assert_eq!(
            failure.to_string(),
            "500:Internal Server Error\nMETHOD:POST\nURI:/visit/load_1\nboom"
        );
    }

    #[tokio::test]
    async fn test_post_sends_expected_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(worker_path(1)))
            .and(header("content-type", "application/json"))
            .and(header("authorization", BASIC_AUTHORIZATION))
            .and(header("x-killbill-createdby", CREATED_BY))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.post(&worker_path(1)).await.expect("post failed");
    }

    #[tokio::test]
    async fn test_redirect_counts_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(303).insert_header("location", "/elsewhere"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.post(&worker_path(2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_carries_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such meter"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post(&worker_path(3)).await.unwrap_err();

        match err {
            RequestFailure::Status {
                status,
                reason,
                method,
                path,
                body,
            } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
                assert_eq!(method, "POST");
                assert_eq!(path, worker_path(3));
                assert_eq!(body, "no such meter");
            }
            other => panic!("Expected status failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HttpRequestClient::new("127.0.0.1", port).unwrap();
        let err = client.post(&worker_path(1)).await.unwrap_err();

        assert!(matches!(err, RequestFailure::Transport { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_http_factory_builds_a_client_per_worker() {
        let factory = HttpClientFactory::new("127.0.0.1", 8080);
        let first = factory.client_for(1).unwrap();
        let second = factory.client_for(2).unwrap();

        assert_eq!(factory.name(), "http");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shared_client_hands_out_one_instance() {
        let shared = SharedClient::new(Arc::new(SimulatedClient::new()));
        let first = shared.client_for(1).unwrap();
        let second = shared.client_for(2).unwrap();

        assert_eq!(shared.name(), "simulated");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_simulated_delay_range() {
        for _ in 0..100 {
            let delay = SimulatedClient::next_delay();
            assert!(delay < Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_client_always_succeeds() {
        let client = SimulatedClient::new();
        assert_eq!(client.name(), "simulated");
        assert!(client.post("/anything").await.is_ok());
    }
}
