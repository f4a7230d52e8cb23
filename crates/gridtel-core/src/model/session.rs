// ── Subscription lifecycle state ──

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a device's stream session is in its reconnect cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum StreamState {
    Connecting,
    Streaming,
    Backoff {
        next_attempt_at: DateTime<Utc>,
        delay_ms: u64,
    },
}

/// Published view of a session, owned and written by its `StreamSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub state: StreamState,
    /// Consecutive failures since the last successful message.
    pub retries: u32,
    pub last_error: Option<String>,
    pub profile_version: u32,
}

impl SessionState {
    pub fn connecting(profile_version: u32) -> Self {
        Self {
            state: StreamState::Connecting,
            retries: 0,
            last_error: None,
            profile_version,
        }
    }
}
