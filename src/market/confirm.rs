//! Recycle confirmation state machine
//!
//! A recycle preview parks an awaiting-confirmation entry keyed by
//! (group, user). The literal 「确认回收」 resolves it, a fresh preview
//! replaces it, and the runner sweeps entries past their deadline.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

type ConvKey = (String, String);

fn key(group_id: &str, user_id: &str) -> ConvKey {
    (group_id.to_string(), user_id.to_string())
}

/// A recycle preview waiting for its confirmation
#[derive(Debug, Clone)]
pub struct PendingRecycle {
    /// Length shown in the preview
    pub previewed_length: f64,
    /// Coins promised by the preview
    pub previewed_coins: i64,
    /// Moment the confirmation window closes
    pub deadline: Instant,
}

impl PendingRecycle {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// How a confirmation attempt resolved
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// 确认回收 arrived inside the window
    Confirmed(PendingRecycle),
    /// 确认回收 arrived after the deadline
    TimedOut,
    /// Nothing was pending for this conversation
    NotPending,
}

/// Pending confirmations keyed by conversation
pub struct ConfirmRegistry {
    pending: Mutex<HashMap<ConvKey, PendingRecycle>>,
    timeout: Duration,
}

impl ConfirmRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Park a new preview; a pending entry for the same conversation is
    /// replaced. Returns true when one was replaced.
    pub async fn begin(
        &self,
        group_id: &str,
        user_id: &str,
        previewed_length: f64,
        previewed_coins: i64,
    ) -> bool {
        let entry = PendingRecycle {
            previewed_length,
            previewed_coins,
            deadline: Instant::now() + self.timeout,
        };
        self.pending
            .lock()
            .await
            .insert(key(group_id, user_id), entry)
            .is_some()
    }

    /// Resolve 「确认回收」 for this conversation, removing the entry
    pub async fn take_confirmed(&self, group_id: &str, user_id: &str) -> ConfirmOutcome {
        let mut pending = self.pending.lock().await;
        match pending.remove(&key(group_id, user_id)) {
            Some(entry) if entry.is_expired(Instant::now()) => ConfirmOutcome::TimedOut,
            Some(entry) => ConfirmOutcome::Confirmed(entry),
            None => ConfirmOutcome::NotPending,
        }
    }

    /// Remove and return every conversation whose window has closed
    pub async fn take_expired(&self) -> Vec<(String, String)> {
        let now = Instant::now();
        let mut pending = self.pending.lock().await;
        let expired: Vec<ConvKey> = pending
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &expired {
            pending.remove(k);
        }
        expired
    }

    /// Whether a confirmation is still pending for this conversation
    pub async fn is_pending(&self, group_id: &str, user_id: &str) -> bool {
        self.pending.lock().await.contains_key(&key(group_id, user_id))
    }
}
