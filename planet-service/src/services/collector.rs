//! Side-channel log forwarder.
//!
//! Entries are queued without blocking the caller and POSTed as JSON to an
//! external collector by a single background worker. Delivery is best effort:
//! a full queue drops the entry, transport failures are logged locally and
//! nothing is retried.

use crate::config::CollectorConfig;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use service_core::observability::TracedClientExt;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// `{"level": ..., "msg": ..., <extra fields>}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub msg: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            level,
            msg: msg.into(),
            fields: Map::new(),
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, msg)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, msg)
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

struct QueuedEntry {
    entry: LogEntry,
    span: Span,
}

#[derive(Clone)]
pub struct CollectorLogger {
    sender: Option<mpsc::Sender<QueuedEntry>>,
}

impl CollectorLogger {
    /// A logger that never makes outbound calls.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Start the delivery worker when a collector URL is configured.
    ///
    /// The worker drains the queue and exits once every clone of the returned
    /// logger is dropped; use [`CollectorWorker::finish`] to wait for it.
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: &CollectorConfig) -> (Self, Option<CollectorWorker>) {
        let Some(url) = config.url.clone() else {
            tracing::info!("Collector URL not set, side-channel logging disabled");
            return (Self::disabled(), None);
        };

        let client = match Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to build collector HTTP client, side-channel logging disabled"
                );
                return (Self::disabled(), None);
            }
        };

        let (sender, receiver) = mpsc::channel(config.queue_size.max(1));
        let handle = tokio::spawn(deliver_entries(client, url, receiver));

        (
            Self {
                sender: Some(sender),
            },
            Some(CollectorWorker {
                handle,
                drain_timeout: config.drain_timeout,
            }),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue an entry for delivery. Never blocks and never fails.
    pub fn send(&self, entry: LogEntry) {
        let Some(sender) = &self.sender else {
            return;
        };

        let queued = QueuedEntry {
            entry,
            span: Span::current(),
        };

        match sender.try_send(queued) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    msg = %dropped.entry.msg,
                    "Collector queue full, dropping log entry"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::warn!(
                    msg = %dropped.entry.msg,
                    "Collector worker stopped, dropping log entry"
                );
            }
        }
    }
}

/// Handle on the delivery worker, used at shutdown.
pub struct CollectorWorker {
    handle: JoinHandle<()>,
    drain_timeout: Duration,
}

impl CollectorWorker {
    /// Wait for the queue to drain, at most the configured drain timeout.
    ///
    /// Drop every [`CollectorLogger`] first or the worker never sees the end
    /// of the queue. Returns `false` when the worker had to be aborted.
    pub async fn finish(mut self) -> bool {
        match tokio::time::timeout(self.drain_timeout, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Collector worker ended abnormally: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    drain_timeout_ms = self.drain_timeout.as_millis() as u64,
                    "Collector did not drain in time, abandoning queued entries"
                );
                self.handle.abort();
                false
            }
        }
    }
}

async fn deliver_entries(client: Client, url: String, mut receiver: mpsc::Receiver<QueuedEntry>) {
    while let Some(QueuedEntry { entry, span }) = receiver.recv().await {
        deliver(&client, &url, &entry).instrument(span).await;
    }
    tracing::debug!("Collector worker stopped");
}

async fn deliver(client: &Client, url: &str, entry: &LogEntry) {
    let result = client
        .traced_post(url)
        .json(entry)
        .send()
        .await
        .and_then(|response| response.error_for_status());

    if let Err(e) = result {
        tracing::error!(error = %e, msg = %entry.msg, "Cribl logging failed");
    }
}
