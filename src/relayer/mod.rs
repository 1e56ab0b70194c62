mod status;
mod submission;

use std::time::Duration;

use log::{debug, info};
use reqwest::Client;

pub use status::{IntentStepStatusResponse, PollOptions, StatusPoller, StepStatus, StepStatusData};
pub use submission::{IntentAuthorization, IntentSubmission, SubmitResponse};

use crate::{
    config::SpiceFlowConfig,
    prelude::*,
    req::{self, HttpClient},
    rfqt::{RfqtRequest, RfqtResponse},
    Error,
};
use submission::RawSubmitResponse;

/// Client for the SpiceFlow relayer API.
#[derive(Debug, Clone)]
pub struct RelayerClient {
    pub http_client: HttpClient,
}

impl RelayerClient {
    pub fn new(client: Option<Client>, base_url: &str) -> Self {
        Self {
            http_client: HttpClient::new(client.unwrap_or_default(), base_url, None),
        }
    }

    /// Uses the configured relayer url and applies `request_timeout` to every request.
    pub fn from_config(client: Option<Client>, config: &SpiceFlowConfig) -> Self {
        Self {
            http_client: HttpClient::new(
                client.unwrap_or_default(),
                config.tx_api_url.as_str(),
                config.request_timeout,
            ),
        }
    }

    /// Sends a signed intent to `POST /transaction/submit`. No retries happen here.
    pub async fn submit(&self, submission: &IntentSubmission) -> Result<SubmitResponse> {
        self.submit_with_timeout(submission, self.http_client.timeout)
            .await
    }

    pub async fn submit_with_timeout(
        &self,
        submission: &IntentSubmission,
        timeout: Option<Duration>,
    ) -> Result<SubmitResponse> {
        let body =
            serde_json::to_string(submission).map_err(|e| Error::JsonParse(e.to_string()))?;
        info!(
            "submitting intent for {:?} covering {} chain(s)",
            submission.address,
            submission.intent_authorization.chain_batches.len()
        );

        let response = self
            .http_client
            .post_with_timeout("/transaction/submit", body, timeout)
            .await
            .map_err(Error::Submission)?;
        debug!("relayer submit response: {response}");

        let raw: RawSubmitResponse = req::parse_json(&response).map_err(Error::Submission)?;
        let response =
            SubmitResponse::from_raw(raw, &submission.intent_authorization.signature);
        info!(
            "intent {} accepted, transaction {:?}",
            response.intent_id, response.hash
        );
        Ok(response)
    }

    /// Fetches the current status of one step of a submitted intent.
    pub async fn intent_step_status(
        &self,
        intent_id: &str,
        step_id: u32,
    ) -> Result<IntentStepStatusResponse> {
        let response = self
            .http_client
            .get(&format!("/intent/{intent_id}/step/{step_id}/status"))
            .await
            .map_err(Error::StatusPoll)?;
        debug!("intent {intent_id} step {step_id} raw status: {response}");
        req::parse_json(&response).map_err(Error::StatusPoll)
    }

    /// Asks the relayer to prepare an RFQT trade the user then executes as a [`crate::Call`].
    pub async fn prepare_rfqt(&self, request: &RfqtRequest) -> Result<RfqtResponse> {
        let body = serde_json::to_string(request).map_err(|e| Error::JsonParse(e.to_string()))?;
        let response = self
            .http_client
            .post("/rfqt", body)
            .await
            .map_err(Error::Rfqt)?;
        req::parse_json(&response).map_err(Error::Rfqt)
    }

    pub fn poller(&self, intent_id: impl Into<String>) -> StatusPoller<'_> {
        StatusPoller::new(self, intent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HttpFailure;

    #[test]
    fn test_from_config_uses_relayer_url_and_timeout() {
        let config = SpiceFlowConfig::new("https://relayer.example/")
            .with_request_timeout(Duration::from_secs(5));
        let relayer = RelayerClient::from_config(None, &config);
        assert_eq!(relayer.http_client.base_url, "https://relayer.example");
        assert_eq!(relayer.http_client.timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_unreachable_relayer_is_a_status_poll_error() {
        let relayer = RelayerClient::new(None, "http://127.0.0.1:1");
        let err = relayer.intent_step_status("intent-1", 0).await.unwrap_err();
        assert!(matches!(err, Error::StatusPoll(HttpFailure::Network(_))));
    }
}
