use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

/// Instruction sent alongside the two snapshots.
pub const COMPARE_INSTRUCTION: &str =
    "Expert film editor check: significant scene change? YES/NO only.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ComparatorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("comparison endpoint rejected the request: {0}")]
    Api(String),
    #[error("malformed comparison response: {0}")]
    Json(#[from] serde_json::Error),
}

/// External visual-comparison capability: two low-fidelity JPEG payloads
/// plus a short instruction in, a short text verdict out. The scheduler
/// only looks for a case-insensitive "yes" in the verdict.
pub trait SceneComparator: Send + Sync {
    fn compare(&self, baseline: &[u8], candidate: &[u8]) -> Result<String, ComparatorError>;
}

/// Talks to a vision endpoint over HTTP: both snapshots go up base64-encoded
/// next to the instruction, the verdict comes back as the response's `text`
/// field.
pub struct HttpComparator {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpComparator {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

impl SceneComparator for HttpComparator {
    fn compare(&self, baseline: &[u8], candidate: &[u8]) -> Result<String, ComparatorError> {
        let body = serde_json::json!({
            "model": self.model,
            "instruction": COMPARE_INSTRUCTION,
            "images": [
                { "mimeType": "image/jpeg", "data": general_purpose::STANDARD.encode(baseline) },
                { "mimeType": "image/jpeg", "data": general_purpose::STANDARD.encode(candidate) },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(ComparatorError::Api(format!(
                "status {}",
                response.status()
            )));
        }

        let payload: Value = serde_json::from_str(&response.text()?)?;
        let verdict = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!("comparator verdict: {verdict}");
        Ok(verdict)
    }
}

/// Canned comparator for tests: hands out scripted verdicts in order and
/// counts how often it was consulted. Once the script runs dry it keeps
/// answering "No".
pub struct MockComparator {
    verdicts: Mutex<VecDeque<Result<String, String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockComparator {
    pub fn with_verdicts(verdicts: Vec<&str>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().map(|v| Ok(v.to_string())).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails on the first consultation.
    pub fn failing(message: &str) -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::from([Err(message.to_string())])),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, usable after the comparator moves into the
    /// scheduler.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl SceneComparator for MockComparator {
    fn compare(&self, _baseline: &[u8], _candidate: &[u8]) -> Result<String, ComparatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .verdicts
            .lock()
            .expect("verdict queue poisoned")
            .pop_front();
        match next {
            Some(Ok(verdict)) => Ok(verdict),
            Some(Err(message)) => Err(ComparatorError::Api(message)),
            None => Ok("No".to_string()),
        }
    }
}
