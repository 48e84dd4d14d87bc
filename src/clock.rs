//! Timer primitive and timestamp helpers.
//!
//! Scheduled units suspend through [`wait`], which parks only the calling
//! task. Under `#[tokio::test(start_paused = true)]` the wait is driven by
//! the paused tokio clock, so multi-minute delays run instantly in tests.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Suspend the current task for `delay` without blocking the runtime.
///
/// A zero delay still yields once so that a freshly spawned unit never
/// runs ahead of the request that scheduled it.
pub async fn wait(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

/// Current UTC instant.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 rendering of the current UTC instant, used in response payloads.
pub fn timestamp() -> String {
    now().to_rfc3339()
}

/// Human-readable delay, e.g. `"5 minutes"`, `"1 minute"`, `"90 seconds"`.
pub fn describe(delay: Duration) -> String {
    if delay.subsec_nanos() != 0 {
        return format!("{} ms", delay.as_millis());
    }
    match delay.as_secs() {
        60 => "1 minute".to_string(),
        secs if secs >= 60 && secs % 60 == 0 => format!("{} minutes", secs / 60),
        1 => "1 second".to_string(),
        secs => format!("{} seconds", secs),
    }
}
