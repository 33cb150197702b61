//! Shared request plumbing for every backend service.

use std::time::Duration;

use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tdlight_common::{Result, TdlightError};
use tdlight_config::BackendSettings;
use tracing::debug;

use crate::sse::EventStream;

/// Handle to one backend instance. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PortalClient {
    base_url: Url,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl PortalClient {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let base_url = Url::parse(settings.base_url.trim()).map_err(|e| {
            TdlightError::Config(format!("invalid backend URL {:?}: {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TdlightError::Config(format!(
                "backend URL {:?} cannot carry a path",
                settings.base_url
            )));
        }
        // No client-wide timeout: it would also cut off progress streams.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .build()?;
        Ok(Self {
            base_url,
            http,
            request_timeout: settings.request_timeout(),
        })
    }

    pub fn from_base_url(base_url: &str) -> Result<Self> {
        Self::new(&BackendSettings {
            base_url: base_url.to_string(),
            ..BackendSettings::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`. Each segment is percent-encoded, so
    /// opaque table names can be passed through verbatim.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    pub(crate) fn get(&self, segments: &[&str]) -> RequestBuilder {
        self.http.get(self.endpoint(segments)).timeout(self.request_timeout)
    }

    pub(crate) fn post(&self, segments: &[&str]) -> RequestBuilder {
        self.http.post(self.endpoint(segments)).timeout(self.request_timeout)
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        debug!(url = %resp.url(), status = resp.status().as_u16(), "Backend response");
        read_json(resp).await
    }

    /// Open a server-sent event stream. The stream counts as open once the
    /// response headers have arrived.
    pub(crate) async fn open_stream(&self, request: RequestBuilder) -> Result<EventStream> {
        let resp = request
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(read_json::<serde_json::Value>(resp)
                .await
                .err()
                .unwrap_or_else(|| TdlightError::Stream("stream endpoint refused connection".into())));
        }
        debug!(url = %resp.url(), "Progress stream opened");
        Ok(EventStream::new(resp))
    }

    /// Stream request with no timeout attached.
    pub(crate) fn stream_request(&self, segments: &[&str]) -> RequestBuilder {
        self.http.get(self.endpoint(segments))
    }
}

/// Decode a backend reply. Non-2xx replies carrying `{"error": "..."}` are
/// the backend refusing the request and become [`TdlightError::Rejected`].
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        if let Some(msg) = parsed.as_ref().and_then(|v| v["error"].as_str()) {
            return Err(TdlightError::Rejected(msg.to_string()));
        }
        let message = parsed
            .as_ref()
            .and_then(|v| v["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.trim().chars().take(200).collect());
        return Err(TdlightError::Api { status: status.as_u16(), message });
    }
    Ok(serde_json::from_str(&body)?)
}
