//! Cluster workload client.
//!
//! The harness consumes the orchestration platform only through the
//! [`WorkloadClient`] seam: create and delete the probe pod, wait for it
//! to reach the running phase, and read evidence files through the pod
//! proxy subresource.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::validate::fetch::{ArtifactFetcher, FetchError};
use crate::workload::spec::PodTask;

#[async_trait]
pub trait WorkloadClient: Send + Sync {
    async fn create_pod(&self, pod: &PodTask) -> Result<()>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;

    /// Blocks until the pod reports the `Running` phase or `timeout`
    /// elapses.
    async fn wait_pod_running(&self, namespace: &str, name: &str, timeout: Duration) -> Result<()>;

    /// Reads one file from the pod through the proxy subresource. `path`
    /// is relative to whatever the pod's webserver exposes.
    async fn proxy_read(&self, namespace: &str, name: &str, path: &str)
        -> Result<Vec<u8>, FetchError>;
}

/// HTTP implementation against the platform API server. Pods travel as
/// YAML, the platform's wire format for workload objects.
pub struct HttpWorkloadClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpWorkloadClient {
    /// `fetch_deadline` is the per-call deadline applied to every request,
    /// distinct from any overall validation timeout.
    pub fn new(base_url: impl Into<String>, fetch_deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch_deadline)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn pods_url(&self, namespace: &str) -> String {
        format!("{}/api/v1/namespaces/{namespace}/pods", self.base_url)
    }

    fn pod_url(&self, namespace: &str, name: &str) -> String {
        format!("{}/{name}", self.pods_url(namespace))
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodTask> {
        let url = self.pod_url(namespace, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to get pod {namespace}/{name}"))?;
        if !response.status().is_success() {
            bail!(
                "failed to get pod {namespace}/{name}: status {}",
                response.status()
            );
        }
        let body = response.text().await.context("failed to read pod body")?;
        serde_yaml::from_str(&body).with_context(|| format!("invalid pod yaml for {namespace}/{name}"))
    }
}

#[async_trait]
impl WorkloadClient for HttpWorkloadClient {
    async fn create_pod(&self, pod: &PodTask) -> Result<()> {
        let namespace = &pod.metadata.namespace;
        let name = &pod.metadata.name;
        let body = serde_yaml::to_string(pod).context("failed to serialize pod yaml")?;
        let response = self
            .client
            .post(self.pods_url(namespace))
            .header("content-type", "application/yaml")
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to create pod {namespace}/{name}"))?;
        if !response.status().is_success() {
            bail!(
                "failed to create pod {namespace}/{name}: status {}",
                response.status()
            );
        }
        info!(pod = %name, namespace = %namespace, "pod created");
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.pod_url(namespace, name))
            .send()
            .await
            .with_context(|| format!("failed to delete pod {namespace}/{name}"))?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            bail!(
                "failed to delete pod {namespace}/{name}: status {}",
                response.status()
            );
        }
        info!(pod = %name, namespace = %namespace, "pod deleted");
        Ok(())
    }

    async fn wait_pod_running(&self, namespace: &str, name: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let pod = self.get_pod(namespace, name).await?;
            let phase = pod.status.phase.as_deref().unwrap_or("Pending");
            if phase == "Running" {
                info!(pod = %name, namespace = %namespace, "pod running");
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("pod {namespace}/{name} still {phase} after {timeout:?}");
            }
            debug!(pod = %name, namespace = %namespace, phase, "waiting for pod to run");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    async fn proxy_read(
        &self,
        namespace: &str,
        name: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/proxy/{path}", self.pod_url(namespace, name));
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::DeadlineExceeded
            } else {
                FetchError::Unavailable(e.to_string())
            }
        })?;
        match response.status() {
            StatusCode::OK => response
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|e| FetchError::Unavailable(e.to_string())),
            StatusCode::GONE => Err(FetchError::Gone(format!("pod {namespace}/{name} gone"))),
            status => Err(FetchError::Unavailable(format!("status {status}"))),
        }
    }
}

/// Fetches evidence files from one pod's results directory, adapting a
/// [`WorkloadClient`] into the validator's fetch seam.
pub struct PodProxyFetcher<C> {
    client: Arc<C>,
    namespace: String,
    pod_name: String,
    directory: String,
}

impl<C> PodProxyFetcher<C> {
    pub fn new(
        client: Arc<C>,
        namespace: impl Into<String>,
        pod_name: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            pod_name: pod_name.into(),
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl<C: WorkloadClient> ArtifactFetcher for PodProxyFetcher<C> {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        self.client
            .proxy_read(
                &self.namespace,
                &self.pod_name,
                &format!("{}/{file_name}", self.directory),
            )
            .await
    }
}
