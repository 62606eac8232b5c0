//! Offline submission queue replayed by the `sync-receipts` background sync.
//!
//! Records stay queued until the server acknowledges them by id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::capture::CaptureInput;

/// Background sync tag that triggers a replay
pub const SYNC_TAG: &str = "sync-receipts";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub input: CaptureInput,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("network unavailable: {0}")]
    Network(String),

    #[error("server rejected submission: {0}")]
    Rejected(String),
}

/// Sends one queued submission; Ok means the server acknowledged it
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, submission: &QueuedSubmission) -> Result<(), SyncError>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub synced: Vec<Uuid>,
    pub remaining: usize,
}

/// Pending submissions keyed by record id, in submission order
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OfflineQueue {
    pending: IndexMap<Uuid, QueuedSubmission>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a submission; returns its record id
    pub fn enqueue(
        &mut self,
        user_id: Uuid,
        session_id: Uuid,
        input: CaptureInput,
        now: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.pending.insert(
            id,
            QueuedSubmission {
                id,
                user_id,
                session_id,
                input,
                queued_at: now,
            },
        );
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&QueuedSubmission> {
        self.pending.get(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Replay queued submissions for `tag`. Other tags are ignored.
    /// A record is dropped only after the transport acknowledges it.
    pub async fn replay(&mut self, tag: &str, transport: &dyn SubmissionTransport) -> SyncReport {
        if tag != SYNC_TAG {
            return SyncReport {
                synced: Vec::new(),
                remaining: self.pending.len(),
            };
        }

        let ids: Vec<Uuid> = self.pending.keys().copied().collect();
        let mut synced = Vec::new();

        for id in ids {
            let Some(submission) = self.pending.get(&id) else {
                continue;
            };
            match transport.submit(submission).await {
                Ok(()) => {
                    self.pending.shift_remove(&id);
                    synced.push(id);
                }
                Err(SyncError::Network(e)) => {
                    tracing::info!("sync paused, {} still queued: {}", self.pending.len(), e);
                    break;
                }
                Err(e) => {
                    tracing::warn!("queued receipt {} not accepted: {}", id, e);
                }
            }
        }

        SyncReport {
            synced,
            remaining: self.pending.len(),
        }
    }
}

/// Body of `POST /api/receipts/sync`
#[derive(Debug, Serialize)]
pub struct SyncBatch<'a> {
    user_id: Uuid,
    session_id: Uuid,
    submissions: Vec<SyncEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct SyncEntry<'a> {
    id: Uuid,
    #[serde(flatten)]
    input: SyncPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum SyncPayload<'a> {
    ImageBase64(String),
    Manual(&'a crate::models::ManualReceipt),
}

impl<'a> SyncBatch<'a> {
    /// One-record batch; images travel base64 encoded
    pub fn for_submission(submission: &'a QueuedSubmission) -> Self {
        use base64::Engine;

        let input = match &submission.input {
            CaptureInput::Image(bytes) => {
                SyncPayload::ImageBase64(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            CaptureInput::Manual(m) => SyncPayload::Manual(m),
        };
        Self {
            user_id: submission.user_id,
            session_id: submission.session_id,
            submissions: vec![SyncEntry {
                id: submission.id,
                input,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyncAck {
    acknowledged: Vec<Uuid>,
}

/// Posts submissions to `POST /api/receipts/sync`
pub struct HttpSubmissionTransport {
    client: reqwest::Client,
    sync_url: String,
}

impl HttpSubmissionTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            sync_url: format!("{}/api/receipts/sync", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn submit(&self, submission: &QueuedSubmission) -> Result<(), SyncError> {
        let batch = SyncBatch::for_submission(submission);

        let response = self
            .client
            .post(&self.sync_url)
            .json(&batch)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(SyncError::Network(format!("server answered {}", response.status())));
        }

        let ack: SyncAck = response
            .json()
            .await
            .map_err(|e| SyncError::Rejected(e.to_string()))?;

        if ack.acknowledged.contains(&submission.id) {
            Ok(())
        } else {
            Err(SyncError::Rejected(format!("{} not acknowledged", submission.id)))
        }
    }
}
