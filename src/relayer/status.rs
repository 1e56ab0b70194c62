use std::{fmt, future::Future, time::Duration};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{
    consts::{DEFAULT_POLL_INTERVAL, DEFAULT_STEP_ID},
    prelude::*,
    relayer::RelayerClient,
    Error,
};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Created,
    Executing,
    Success,
    Reverted,
}

impl StepStatus {
    /// `success` and `reverted` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Success | StepStatus::Reverted)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Created => "created",
            StepStatus::Executing => "executing",
            StepStatus::Success => "success",
            StepStatus::Reverted => "reverted",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepStatusData {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Response of `GET /intent/{intentId}/step/{stepId}/status`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IntentStepStatusResponse {
    pub success: bool,
    pub data: StepStatusData,
}

impl IntentStepStatusResponse {
    pub fn status(&self) -> StepStatus {
        self.data.status
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        self.data.transaction_hash.as_deref()
    }
}

/// Which step to watch, how often, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub step_id: u32,
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            step_id: DEFAULT_STEP_ID,
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Waits for one step of a submitted intent to reach a terminal status.
///
/// Checks once immediately, then once per `interval`. Failed checks are logged and retried on
/// the next tick; only the timeout or the cancel future end the wait early.
#[derive(Debug, Clone)]
pub struct StatusPoller<'a> {
    relayer: &'a RelayerClient,
    intent_id: String,
    step_id: u32,
    interval: Duration,
    timeout: Option<Duration>,
}

impl<'a> StatusPoller<'a> {
    pub fn new(relayer: &'a RelayerClient, intent_id: impl Into<String>) -> Self {
        Self {
            relayer,
            intent_id: intent_id.into(),
            step_id: DEFAULT_STEP_ID,
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.step_id = options.step_id;
        self.interval = options.interval;
        self.timeout = options.timeout;
        self
    }

    pub fn step(mut self, step_id: u32) -> Self {
        self.step_id = step_id;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn wait<C>(self, cancel: C) -> Result<IntentStepStatusResponse>
    where
        C: Future<Output = ()>,
    {
        self.wait_with_updates(cancel, |_| {}).await
    }

    /// Like [`StatusPoller::wait`], reporting every fetched status to `on_update`.
    pub async fn wait_with_updates<C, U>(
        self,
        cancel: C,
        mut on_update: U,
    ) -> Result<IntentStepStatusResponse>
    where
        C: Future<Output = ()>,
        U: FnMut(&IntentStepStatusResponse),
    {
        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        tokio::pin!(cancel);

        info!(
            "polling intent {} step {} every {:?}, timeout {:?}",
            self.intent_id, self.step_id, self.interval, self.timeout
        );

        let mut attempts: u32 = 0;
        let mut last_status: Option<StepStatus> = None;
        let mut last_tx_hash: Option<String> = None;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = &mut cancel => return Err(self.cancelled(attempts)),
                _ = sleep_until(deadline) => return Err(self.timed_out(attempts, last_status)),
                fetched = self.relayer.intent_step_status(&self.intent_id, self.step_id) => fetched,
            };
            attempts += 1;

            match fetched {
                Ok(response) => {
                    let status = response.status();
                    match last_status {
                        Some(previous) if previous == status => info!(
                            "intent {} step {} status unchanged ({status}), attempt {attempts}, {:?}",
                            self.intent_id,
                            self.step_id,
                            started.elapsed()
                        ),
                        previous => info!(
                            "intent {} step {} status {} -> {status}, attempt {attempts}, {:?}",
                            self.intent_id,
                            self.step_id,
                            previous.map_or_else(|| "n/a".to_string(), |s| s.to_string()),
                            started.elapsed()
                        ),
                    }
                    last_status = Some(status);

                    if let Some(tx_hash) = response.transaction_hash() {
                        if last_tx_hash.as_deref() != Some(tx_hash) {
                            info!("intent {} step {} transaction {tx_hash}", self.intent_id, self.step_id);
                            last_tx_hash = Some(tx_hash.to_string());
                        }
                    }

                    on_update(&response);
                    if status.is_terminal() {
                        info!(
                            "stopped polling intent {} after {attempts} attempt(s), {:?}",
                            self.intent_id,
                            started.elapsed()
                        );
                        return Ok(response);
                    }
                }
                Err(e) => warn!(
                    "status check {attempts} for intent {} step {} failed: {e}",
                    self.intent_id, self.step_id
                ),
            }

            tokio::select! {
                biased;
                _ = &mut cancel => return Err(self.cancelled(attempts)),
                _ = sleep_until(deadline) => return Err(self.timed_out(attempts, last_status)),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn cancelled(&self, attempts: u32) -> Error {
        info!(
            "polling intent {} cancelled after {attempts} attempt(s)",
            self.intent_id
        );
        Error::StatusPollCancelled {
            intent_id: self.intent_id.clone(),
            step_id: self.step_id,
        }
    }

    fn timed_out(&self, attempts: u32, last_status: Option<StepStatus>) -> Error {
        warn!(
            "polling intent {} timed out after {attempts} attempt(s)",
            self.intent_id
        );
        Error::StatusPollTimeout {
            intent_id: self.intent_id.clone(),
            step_id: self.step_id,
            attempts,
            last_status,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
