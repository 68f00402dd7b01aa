//! REST backend: a privileged sidecar applies the commands.
//!
//! ```text
//! POST {base}/tc/apply          {"node": "node2", "command": "latency", "value": {"ms": 500}}
//! GET  {base}/tc/stats/{node}?interface=eth0
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tc_types::{ApplyRequest, Impairment, Rate, StatsResponse};

use super::{Outcome, TcBackend};
use crate::error::{Result, TcError};

/// Client for the traffic-control sidecar.
///
/// One HTTP round trip per call and no retries. The sidecar shapes the interface
/// it is configured with; only [`stats`](TcBackend::stats) can name another.
#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: String,
    http: reqwest::Client,
}

impl RestBackend {
    /// Create a client for the sidecar at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Create a client for `http://{host}:{port}`.
    pub fn from_host_port(host: &str, port: u16) -> Self {
        Self::new(format!("http://{host}:{port}"))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the apply endpoint.
    pub fn apply_url(&self) -> String {
        format!("{}/tc/apply", self.base_url)
    }

    /// URL of the statistics endpoint for `node`.
    ///
    /// `node` is a single path segment; `/`, `?`, `#` and the like are percent-encoded.
    pub fn stats_url(&self, node: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&format!("{}/tc/stats", self.base_url))
            .map_err(|e| TcError::Transport(format!("invalid sidecar url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| TcError::Transport(format!("invalid sidecar url {}", self.base_url)))?
            .push(node);
        Ok(url.into())
    }

    /// Send a raw command to the sidecar and return its decoded response.
    ///
    /// `command` and `value` are passed through unchecked; the sidecar validates.
    pub async fn apply_raw(&self, node: &str, command: &str, value: Value) -> Result<Value> {
        self.post(&ApplyRequest::raw(node, command, value)).await
    }

    /// Install `netem delay` on `node`.
    pub async fn add_latency(&self, node: &str, delay_ms: u32, jitter_ms: Option<u32>) -> Result<Value> {
        self.post(&ApplyRequest::new(node, &Impairment::latency(delay_ms, jitter_ms)))
            .await
    }

    /// Install independent `netem loss` on `node`.
    pub async fn add_packet_loss(&self, node: &str, percent: f64) -> Result<Value> {
        let impairment = Impairment::packet_loss(percent)?;
        self.post(&ApplyRequest::new(node, &impairment)).await
    }

    /// Install correlated `netem loss` on `node`.
    pub async fn add_packet_loss_correlated(
        &self,
        node: &str,
        percent: f64,
        correlation_percent: f64,
    ) -> Result<Value> {
        let impairment = Impairment::correlated_packet_loss(percent, correlation_percent)?;
        self.post(&ApplyRequest::new(node, &impairment)).await
    }

    /// Install a `tbf` rate limit on `node`.
    pub async fn add_bandwidth(&self, node: &str, rate: &Rate) -> Result<Value> {
        let impairment = Impairment::Bandwidth { rate: rate.clone() };
        self.post(&ApplyRequest::new(node, &impairment)).await
    }

    /// Remove whatever is installed on `node`.
    pub async fn clear(&self, node: &str) -> Result<Value> {
        self.post(&ApplyRequest::new(node, &Impairment::Clear)).await
    }

    async fn post(&self, request: &ApplyRequest) -> Result<Value> {
        let url = self.apply_url();
        let payload = serde_json::to_string(request)
            .map_err(|e| TcError::Transport(format!("unencodable request: {e}")))?;
        tracing::info!("TC request POST {} payload={}", url, payload);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        tracing::info!("TC response status={}", status.as_u16());

        let body = response.text().await?;
        if !status.is_success() {
            return Err(TcError::Transport(format!(
                "POST {url} returned {status}: {}",
                body.trim()
            )));
        }

        decode_body(&body)
    }
}

fn decode_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| TcError::Transport(format!("undecodable response: {e}")))
}

#[async_trait]
impl TcBackend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn apply(&self, node: &str, _interface: &str, impairment: &Impairment) -> Result<Outcome> {
        impairment.validate()?;
        let value = self.post(&ApplyRequest::new(node, impairment)).await?;
        Ok(Outcome::Remote(value))
    }

    async fn stats(&self, node: &str, interface: &str) -> Result<String> {
        let url = self.stats_url(node)?;
        tracing::info!("TC request GET {} interface={}", url, interface);

        let response = self
            .http
            .get(&url)
            .query(&[("interface", interface)])
            .send()
            .await?;

        let status = response.status();
        tracing::info!("TC response status={}", status.as_u16());

        let body = response.text().await?;
        if !status.is_success() {
            return Err(TcError::Transport(format!(
                "GET {url} returned {status}: {}",
                body.trim()
            )));
        }

        let stats: StatsResponse = serde_json::from_str(&body)
            .map_err(|e| TcError::Transport(format!("undecodable response: {e}")))?;
        Ok(stats.stats)
    }

    async fn resolve_pid(&self, _node: &str) -> Result<u32> {
        Err(TcError::Unsupported {
            operation: "resolve_pid",
            backend: "rest",
        })
    }
}
