use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// An inbound HTTP request as handed to the UI runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingRequest {
    pub id: u64,
    pub method: String,
    pub url: String,
    /// Canonical header names (`Content-Type`); the first value wins when a
    /// name repeats
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl PendingRequest {
    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a request from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The UI runtime's answer to a [`PendingRequest`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl ResponseRecord {
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// One line of the stdio intake: a response tagged with its request id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl ResponseEnvelope {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_parts(self) -> (u64, ResponseRecord) {
        (
            self.id,
            ResponseRecord {
                status: self.status,
                headers: self.headers,
                body: self.body,
            },
        )
    }
}

/// Wall-clock nanosecond tokens, strictly increasing within a process
#[derive(Debug, Default)]
pub struct SequenceClock {
    last: AtomicI64,
}

impl SequenceClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}
