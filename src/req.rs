use std::time::Duration;

use log::debug;
use reqwest::{Client, RequestBuilder, Response};

use crate::errors::HttpFailure;

#[derive(Debug, Clone)]
pub struct HttpClient {
    pub client: Client,
    pub base_url: String,
    /// Applied to every request unless a call passes its own.
    pub timeout: Option<Duration>,
}

async fn parse_response(response: Response) -> Result<String, HttpFailure> {
    let status_code = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| HttpFailure::Network(e.to_string()))?;

    if (200..300).contains(&status_code) {
        return Ok(text);
    }
    Err(HttpFailure::Status {
        status_code,
        body: text,
    })
}

impl HttpClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn post(&self, url_path: &str, data: String) -> Result<String, HttpFailure> {
        self.post_with_timeout(url_path, data, self.timeout).await
    }

    pub async fn post_with_timeout(
        &self,
        url_path: &str,
        data: String,
        timeout: Option<Duration>,
    ) -> Result<String, HttpFailure> {
        let full_url = format!("{}{url_path}", self.base_url);
        debug!("POST {full_url} {data}");
        let request = self
            .client
            .post(full_url)
            .header("Content-Type", "application/json")
            .body(data);
        execute(request, timeout).await
    }

    pub async fn get(&self, url_path: &str) -> Result<String, HttpFailure> {
        let full_url = format!("{}{url_path}", self.base_url);
        debug!("GET {full_url}");
        execute(self.client.get(full_url), self.timeout).await
    }
}

/// Sends `request` and reads the whole body, giving up after `timeout`.
pub(crate) async fn execute(
    request: RequestBuilder,
    timeout: Option<Duration>,
) -> Result<String, HttpFailure> {
    let exchange = async {
        let response = request
            .send()
            .await
            .map_err(|e| HttpFailure::Network(e.to_string()))?;
        parse_response(response).await
    };
    match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| HttpFailure::Timeout(limit))?,
        None => exchange.await,
    }
}

/// Deserializes a JSON response body, keeping the raw body on failure.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, HttpFailure> {
    serde_json::from_str(body).map_err(|e| HttpFailure::MalformedResponse {
        reason: e.to_string(),
        body: body.to_string(),
    })
}
