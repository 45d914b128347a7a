//! The single request/reply exchange between the page extractor and the
//! syncer.
//!
//! A request carries a [`Message`] and is answered with exactly one
//! [`PushResult`]. The wire shapes match what the browser side sends:
//! `{"type": "PUSH_CODE_TO_GITHUB", "data": {...}}` and
//! `{"success": true, "url": ...}` / `{"success": false, "error": ...}`.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

/// Everything scraped from a solved-problem page for one push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub problem_title: String,
    pub problem_slug: String,
    pub language: String,
    pub file_extension: String,
    pub code: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Message {
    #[serde(rename = "PUSH_CODE_TO_GITHUB")]
    PushCodeToGithub(SubmissionPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PushReply", from = "PushReply")]
pub enum PushResult {
    Pushed { url: Option<String> },
    Failed { error: String },
}

#[derive(Serialize, Deserialize)]
struct PushReply {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<PushResult> for PushReply {
    fn from(result: PushResult) -> Self {
        match result {
            PushResult::Pushed { url } => Self {
                success: true,
                url,
                error: None,
            },
            PushResult::Failed { error } => Self {
                success: false,
                url: None,
                error: Some(error),
            },
        }
    }
}

impl From<PushReply> for PushResult {
    fn from(reply: PushReply) -> Self {
        if reply.success {
            Self::Pushed { url: reply.url }
        } else {
            Self::Failed {
                error: reply.error.unwrap_or_default(),
            }
        }
    }
}

impl PushResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Pushed { .. })
    }
}

/// One in-flight request, answered at most once.
#[derive(Debug)]
pub struct Request {
    pub message: Message,
    reply: oneshot::Sender<PushResult>,
}

impl Request {
    pub fn respond(self, result: PushResult) {
        if self.reply.send(result).is_err() {
            tracing::debug!("sender went away before the reply was delivered");
        }
    }
}

/// Sending half, held by the extractor.
#[derive(Debug, Clone)]
pub struct SyncerHandle {
    tx: mpsc::Sender<Request>,
}

/// Receiving half, consumed by the syncer.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Request>,
}

pub fn channel(buffer: usize) -> (SyncerHandle, Inbox) {
    let (tx, rx) = mpsc::channel(buffer);
    (SyncerHandle { tx }, Inbox { rx })
}

impl SyncerHandle {
    /// Send one message and wait for its reply. There is no timeout: a
    /// syncer that never answers keeps this future pending.
    pub async fn send(&self, message: Message) -> Result<PushResult> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { message, reply })
            .await
            .map_err(|_| Error::Transport("Receiving end does not exist.".into()))?;
        rx.await.map_err(|_| {
            Error::Transport("The message port closed before a response was received.".into())
        })
    }
}

impl Inbox {
    pub async fn recv(&mut self) -> Option<Request> {
        self.rx.recv().await
    }
}
