pub mod telegram;

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{error, info};

use crate::model::AlertEvent;

pub use telegram::TelegramDispatcher;

/// Delivers alerts to people. Best-effort: implementations log their own
/// delivery failures and never report them back to the caller.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// A threshold alert.
    async fn dispatch(&self, alert: &AlertEvent);

    /// A failed or aborted tick.
    async fn dispatch_error(&self, message: &str);
}

/// Writes alerts to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    async fn dispatch(&self, alert: &AlertEvent) {
        info!(kind = %alert.kind, subject = %alert.subject, "{}", alert.message);
    }

    async fn dispatch_error(&self, message: &str) {
        error!("{message}");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Alert(AlertEvent),
    Error(String),
}

/// Keeps everything it is handed, in order.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Dispatched>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Dispatched> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.sent()
            .into_iter()
            .filter_map(|d| match d {
                Dispatched::Alert(a) => Some(a),
                Dispatched::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|d| match d {
                Dispatched::Error(e) => Some(e),
                Dispatched::Alert(_) => None,
            })
            .collect()
    }

    fn push(&self, item: Dispatched) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(item);
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(&self, alert: &AlertEvent) {
        self.push(Dispatched::Alert(alert.clone()));
    }

    async fn dispatch_error(&self, message: &str) {
        self.push(Dispatched::Error(message.to_string()));
    }
}
