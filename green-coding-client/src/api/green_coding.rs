use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, MetricsApi};
use crate::domain::{MeasurementQuery, MeasurementRow, RunDescriptor};

/// reqwest-backed client for the Green Coding CI endpoints.
///
/// The HTTP client and base URL are passed in so tests can point it at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct GreenCodingApi {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct ServerError {
    #[serde(default)]
    err: Vec<ServerErrorDetail>,
}

#[derive(Deserialize)]
struct ServerErrorDetail {
    #[serde(default)]
    msg: Option<Value>,
}

impl GreenCodingApi {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.green-coding.io/v1/ci/";

    pub fn new(client: Client, base_url: &str) -> Result<Self, ApiError> {
        // Url::join drops the last path segment unless it ends with '/'.
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::Transport(format!("invalid base url '{base_url}': {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ApiError::Transport(format!("invalid endpoint '{endpoint}': {e}")))?;

        metrics::counter!("eco_ci_api_requests_total").increment(1);
        tracing::debug!(%url, ?params, "requesting green coding api");

        let result = self.client.get(url).query(params).send().await;
        let response = match result {
            Ok(r) => r,
            Err(e) => {
                metrics::counter!("eco_ci_api_errors_total").increment(1);
                tracing::warn!(error = %e, endpoint, "green coding api request failed");
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        let res = decode_response(response).await;
        if let Err(e) = &res {
            metrics::counter!("eco_ci_api_errors_total").increment(1);
            tracing::warn!(error = %e, endpoint, "green coding api returned an error");
        }
        res
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<Vec<T>, ApiError> {
    let status = response.status();

    // 204 carries no body at all.
    if status == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ServerError>(&body)
            .ok()
            .and_then(|e| e.err.into_iter().next())
            .and_then(|d| d.msg)
            .map(|msg| match msg {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope =
        serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(format!("invalid envelope: {e}")))?;

    if !envelope.success {
        let reason = envelope
            .data
            .as_ref()
            .and_then(|d| d.get("statusText"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
        return Err(ApiError::Unsuccessful(reason));
    }

    match envelope.data {
        Some(data @ Value::Array(_)) => {
            serde_json::from_value(data).map_err(|e| ApiError::Malformed(format!("invalid row: {e}")))
        }
        Some(other) => Err(ApiError::Malformed(format!("expected an array of rows, got {other}"))),
        None => Err(ApiError::Malformed("envelope has no data".to_string())),
    }
}

#[async_trait::async_trait]
impl MetricsApi for GreenCodingApi {
    async fn measurements(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementRow>, ApiError> {
        self.get("measurements", &query.to_params()).await
    }

    async fn runs(&self, repo: &str) -> Result<Vec<RunDescriptor>, ApiError> {
        let params = [("repo", repo.to_string()), ("sort_by", "date".to_string())];
        self.get("runs", &params).await
    }
}
