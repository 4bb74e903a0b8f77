//! HTTP client for the LMS ajax web service
//!
//! Calls are POSTed as a single-element batch to `lib/ajax/service.php`,
//! which answers with a batch of response documents.

use super::traits::RpcTransport;
use super::types::{RpcRequest, RpcResponse};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const SERVICE_PATH: &str = "lib/ajax/service.php";

/// Client for the plugin's ajax methods
pub struct AjaxClient {
    http: Client,
    site_url: String,
    sesskey: String,
}

impl AjaxClient {
    pub fn new(site_url: &str, sesskey: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http,
            site_url: site_url.trim_end_matches('/').to_string(),
            sesskey: sesskey.to_string(),
        })
    }

    fn service_url(&self) -> String {
        format!("{}/{SERVICE_PATH}", self.site_url)
    }
}

#[async_trait]
impl RpcTransport for AjaxClient {
    async fn call(&self, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        let method = request.method();
        let args = request
            .args()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let body = json!([{ "index": 0, "methodname": method, "args": args }]);

        let response = self
            .http
            .post(self.service_url())
            .query(&[("sesskey", self.sesskey.as_str()), ("info", method)])
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        // Failure is decided by the response document, not the HTTP status
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(format!("status {status}: {e}")))?;

        parse_batch(payload)
    }
}

/// Take the first document of a response batch
///
/// Session-level errors come back as a bare object rather than a batch.
fn parse_batch(payload: Value) -> Result<RpcResponse, TransportError> {
    let document = match payload {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(TransportError::InvalidResponse(
                    "empty response batch".to_string(),
                ));
            }
            items.swap_remove(0)
        }
        other => other,
    };

    serde_json::from_value(document).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}
