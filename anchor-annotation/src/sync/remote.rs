use std::time::Duration;

use bevy::log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;

use super::record::PushRecord;
use crate::config::SyncConfig;
use crate::error::{AnnotationError, Result};

/// Remote anchor store. Calls block; the sync worker runs them off the frame thread.
pub trait RemoteStore: Send + 'static {
    /// Raw elements of the room's anchor list. Elements are decoded one by one
    /// so a single bad record does not poison the batch.
    fn fetch_anchors(&self, room_id: &str) -> Result<Vec<Value>>;

    /// Upload one anchor. Only HTTP 200 counts as success.
    fn push_anchor(&self, record: &PushRecord) -> Result<Value>;
}

/// JSON-over-HTTP store exposing `GET /ardata/{roomId}` and `POST /push_data`.
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RemoteStore for HttpRemoteStore {
    fn fetch_anchors(&self, room_id: &str) -> Result<Vec<Value>> {
        let url = format!("{}/ardata/{}", self.base_url, room_id);
        let response = self.client.get(&url).header(ACCEPT, "application/json").send()?;

        if !response.status().is_success() {
            return Err(AnnotationError::Status {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<Vec<Value>>()?)
    }

    fn push_anchor(&self, record: &PushRecord) -> Result<Value> {
        let url = format!("{}/push_data", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(record)
            .send()?;

        if response.status() != StatusCode::OK {
            return Err(AnnotationError::Status {
                status: response.status().as_u16(),
            });
        }

        // Body is informational only; keep it even if it is not JSON.
        let body = response.text()?;
        let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        debug!("push_data accepted {}: {}", record.hashcode, value);
        Ok(value)
    }
}
