use super::types::*;
use crate::{Error, Result, config::ServiceConfig, request::GenerationRequest};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The slice of the Stable Diffusion WebUI API this adapter relies on.
#[async_trait]
pub trait WebUiApi: Send + Sync {
    /// Runs one generation, retrying transient failures.
    async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationResult>;
    async fn options(&self) -> Result<WebUiOptions>;
    async fn set_options(&self, options: Value) -> Result<()>;
    async fn models(&self) -> Result<Vec<SdModel>>;
    async fn vaes(&self) -> Result<Vec<SdVae>>;
    async fn hypernetworks(&self) -> Result<Vec<Value>>;
    async fn system_info(&self) -> Result<Value>;
    async fn controlnet_models(&self) -> Result<Vec<String>>;
    async fn ping(&self) -> Result<()>;
}

/// Upper bound for the startup reachability check, independent of the
/// generation timeout.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a WebUI instance started with `--api`.
#[derive(Debug, Clone)]
pub struct WebUiClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    timeout: Duration,
    retry_delay: Duration,
    ping_timeout: Duration,
    layer_diffuse: Option<String>,
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Done(Vec<u8>),
    Retry(String),
}

impl WebUiClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_seconds),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            ping_timeout: PING_TIMEOUT,
            layer_diffuse: None,
        }
    }

    /// Use a custom `reqwest::Client` (proxies, TLS, connection pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Enables the LayerDiffuse extension for transparent requests.
    pub fn with_layer_diffuse(mut self, method: impl Into<String>) -> Self {
        self.layer_diffuse = Some(method.into());
        self
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Sends one request and classifies the outcome. 4xx and timeouts are
    /// terminal; connection failures and 5xx are worth another attempt.
    async fn attempt(&self, request: RequestBuilder) -> Result<Attempt> {
        let response = match request.timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(Error::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(e) => return Ok(Attempt::Retry(format!("request failed: {}", e))),
        };

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BadRequest {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Retry(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        match response.bytes().await {
            Ok(bytes) => Ok(Attempt::Done(bytes.to_vec())),
            Err(e) if e.is_timeout() => Err(Error::Timeout {
                seconds: self.timeout.as_secs(),
            }),
            Err(e) => Ok(Attempt::Retry(format!("failed to read response body: {}", e))),
        }
    }

    async fn send_with_retry<F>(&self, endpoint: &str, build: F) -> Result<Vec<u8>>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("POST {} (attempt {}/{})", endpoint, attempt, attempts);
            match self.attempt(build()).await? {
                Attempt::Done(body) => return Ok(body),
                Attempt::Retry(reason) => {
                    warn!(
                        "WebUI call to {} failed (attempt {}/{}): {}",
                        endpoint, attempt, attempts, reason
                    );
                    last_error = reason;
                }
            }
            if attempt < attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay * attempt).await;
            }
        }

        Err(Error::ServiceUnavailable {
            attempts,
            last_error,
        })
    }

    /// Single-attempt call used for the informational endpoints.
    async fn call_once(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Vec<u8>> {
        let mut request = self.http.request(method, self.url(endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }
        match self.attempt(request).await? {
            Attempt::Done(bytes) => Ok(bytes),
            Attempt::Retry(reason) => Err(Error::ServiceUnavailable {
                attempts: 1,
                last_error: reason,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let body = self.call_once(Method::GET, endpoint, None).await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::invalid_response(format!("{} returned unexpected JSON: {}", endpoint, e)))
    }
}

#[async_trait]
impl WebUiApi for WebUiClient {
    async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let payload = GenerationPayload::from_request(request, self.layer_diffuse.as_deref());
        let endpoint = payload.endpoint();
        let url = self.url(endpoint);

        info!(
            "Dispatching {} ({}x{}, {} steps, sampler {})",
            endpoint, request.width, request.height, request.steps, request.sampler
        );

        let started = Instant::now();
        let body = self
            .send_with_retry(endpoint, || self.http.post(&url).json(&payload))
            .await?;

        let response: GenerationResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::invalid_response(format!("malformed generation response: {}", e)))?;
        let result = response.into_result(request.seed, started.elapsed())?;

        info!(
            "Generation finished in {:.1}s (seed {}, {} bytes)",
            result.elapsed.as_secs_f64(),
            result.seed_used,
            result.image_bytes.len()
        );
        Ok(result)
    }

    async fn options(&self) -> Result<WebUiOptions> {
        self.get_json(OPTIONS_ENDPOINT).await
    }

    async fn set_options(&self, options: Value) -> Result<()> {
        self.call_once(Method::POST, OPTIONS_ENDPOINT, Some(&options))
            .await
            .map(|_| ())
    }

    async fn models(&self) -> Result<Vec<SdModel>> {
        self.get_json(MODELS_ENDPOINT).await
    }

    async fn vaes(&self) -> Result<Vec<SdVae>> {
        self.get_json(VAE_ENDPOINT).await
    }

    async fn hypernetworks(&self) -> Result<Vec<Value>> {
        self.get_json(HYPERNETWORKS_ENDPOINT).await
    }

    async fn system_info(&self) -> Result<Value> {
        self.get_json(SYSTEM_INFO_ENDPOINT).await
    }

    async fn controlnet_models(&self) -> Result<Vec<String>> {
        let value: Value = self.get_json(CONTROLNET_MODELS_ENDPOINT).await?;
        Ok(value
            .get("model_list")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        match self.http.get(self.url("/")).timeout(self.ping_timeout).send().await {
            Ok(response) if response.status() == StatusCode::OK => Ok(()),
            Ok(response) => Err(Error::ServiceUnavailable {
                attempts: 1,
                last_error: format!("HTTP {}", response.status().as_u16()),
            }),
            Err(e) if e.is_timeout() => Err(Error::Timeout {
                seconds: self.ping_timeout.as_secs(),
            }),
            Err(e) => Err(Error::ServiceUnavailable {
                attempts: 1,
                last_error: e.to_string(),
            }),
        }
    }
}
