//! Builder pattern for Orchestrator construction

use std::sync::Arc;

use tracing::Span;

use crate::client::{
    ClientFactory, HttpClientFactory, RequestClient, SharedClient, SimulatedClient,
};
use crate::config::LoadConfig;
use crate::error::{LoadError, LoadResult};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// When no client is supplied, clients come from the config: one shared
/// [`SimulatedClient`] if `simulate` is set, otherwise a fresh
/// [`HttpRequestClient`](crate::client::HttpRequestClient) per worker for
/// `server_host:server_port`.
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .workers(10)
///     .iterations(1000)
///     .server("127.0.0.1", 8080)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: LoadConfig,
    clients: Option<Arc<dyn ClientFactory>>,
    span: Option<Span>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LoadConfig::default(),
            clients: None,
            span: None,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: LoadConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the number of requests per worker
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the target server
    pub fn server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.server_host = host.into();
        self.config.server_port = port;
        self
    }

    /// Share one request client between all workers
    pub fn client(mut self, client: Arc<dyn RequestClient>) -> Self {
        self.clients = Some(Arc::new(SharedClient::new(client)));
        self
    }

    /// Set where each worker's request client comes from
    pub fn client_factory(mut self, clients: Arc<dyn ClientFactory>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Set the span the run and its workers log under
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn build(self) -> LoadResult<Orchestrator> {
        self.config
            .validate()
            .map_err(|e| LoadError::config(e.to_string()))?;

        let clients: Arc<dyn ClientFactory> = match self.clients {
            Some(clients) => clients,
            None if self.config.simulate => {
                Arc::new(SharedClient::new(Arc::new(SimulatedClient::new())))
            }
            None => Arc::new(HttpClientFactory::new(
                self.config.server_host.clone(),
                self.config.server_port,
            )),
        };

        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!(
                "load_run",
                workers = self.config.workers,
                iterations = self.config.iterations
            )
        });

        Ok(Orchestrator::new(self.config, clients, span))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
