use crate::error::{Error, Result};
use crate::worker::creator::ConnectorCreator;
use crate::worker::model::{
    ConnectorInfo, ConnectorStatus, CreateRequest, ErrorResponse, Plugin,
};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a cluster of Connect workers.
///
/// Requests rotate over the configured workers. A worker that refuses the
/// connection is skipped in favour of the next one; a timeout is returned as
/// is, since the worker may already have applied the request.
pub struct WorkerClient {
    http: Client,
    workers: Vec<String>,
    next: AtomicUsize,
}

impl WorkerClient {
    /// Create a client from `host:port[,host:port...]`.
    ///
    /// Entries may carry an explicit `http://` or `https://` scheme.
    pub fn new(workers: &str) -> Result<Self> {
        Self::with_timeout(workers, REQUEST_TIMEOUT)
    }

    /// Like [`WorkerClient::new`] with a custom per-request timeout.
    pub fn with_timeout(workers: &str, timeout: Duration) -> Result<Self> {
        let workers: Vec<String> = workers
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(|w| {
                if w.starts_with("http://") || w.starts_with("https://") {
                    w.trim_end_matches('/').to_string()
                } else {
                    format!("http://{}", w.trim_end_matches('/'))
                }
            })
            .collect();
        if workers.is_empty() {
            return Err(Error::InvalidConfig(
                "worker connection props must not be empty".to_string(),
            ));
        }

        for worker in &workers {
            Url::parse(worker)
                .map_err(|e| Error::InvalidConfig(format!("Invalid worker {worker}: {e}")))?;
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            workers,
            next: AtomicUsize::new(0),
        })
    }

    /// Base URLs of the configured workers.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// Start defining a connector; finish with [`ConnectorCreator::create`].
    pub fn connector_creator(&self) -> ConnectorCreator<'_> {
        ConnectorCreator::new(self)
    }

    /// Submit a connector definition as-is.
    pub async fn create(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<ConnectorInfo> {
        let body = serde_json::to_value(CreateRequest { name, config })?;
        let response = self
            .request(Method::POST, &["connectors"], Some(&body))
            .await?;
        let info: ConnectorInfo = response.json().await?;
        tracing::info!(
            "Created connector {} of class {}",
            info.name,
            config
                .get("connector.class")
                .map(String::as_str)
                .unwrap_or("<unknown>")
        );
        Ok(info)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.request(Method::DELETE, &["connectors", name], None)
            .await?;
        tracing::info!("Deleted connector {name}");
        Ok(())
    }

    /// Names of the connectors currently defined on the cluster.
    pub async fn active_connectors(&self) -> Result<Vec<String>> {
        self.get_json(&["connectors"]).await
    }

    pub async fn exist(&self, name: &str) -> Result<bool> {
        Ok(self.active_connectors().await?.iter().any(|c| c == name))
    }

    pub async fn pause(&self, name: &str) -> Result<()> {
        self.request(Method::PUT, &["connectors", name, "pause"], None)
            .await?;
        tracing::info!("Paused connector {name}");
        Ok(())
    }

    pub async fn resume(&self, name: &str) -> Result<()> {
        self.request(Method::PUT, &["connectors", name, "resume"], None)
            .await?;
        tracing::info!("Resumed connector {name}");
        Ok(())
    }

    pub async fn status(&self, name: &str) -> Result<ConnectorStatus> {
        self.get_json(&["connectors", name, "status"]).await
    }

    pub async fn config(&self, name: &str) -> Result<BTreeMap<String, String>> {
        self.get_json(&["connectors", name, "config"]).await
    }

    /// Connector classes installed on the workers.
    pub async fn plugins(&self) -> Result<Vec<Plugin>> {
        self.get_json(&["connector-plugins"]).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self.request(Method::GET, segments, None).await?;
        Ok(response.json().await?)
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        for i in 0..self.workers.len() {
            let worker = &self.workers[(start + i) % self.workers.len()];
            let url = Self::url(worker, segments)?;
            tracing::debug!("{method} {url}");

            let mut builder = self.http.request(method.clone(), url);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(response) => return Self::check(response).await,
                Err(e) if e.is_connect() => {
                    tracing::warn!("Worker {worker} unreachable: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::NoWorkerAvailable(self.workers.join(",")))
    }

    /// Connector names are user input, so every segment is percent-encoded.
    fn url(worker: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(worker)
            .map_err(|e| Error::InvalidConfig(format!("Invalid worker {worker}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("Invalid worker {worker}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => err.message,
            Err(_) if !text.trim().is_empty() => text,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(Error::Worker {
            status: status.as_u16(),
            message,
        })
    }
}
