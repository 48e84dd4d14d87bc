//! Delayed task scheduler: each scheduled call runs as an independent task
//! that waits, invokes the target, then records the outcome.

pub mod engine;
pub mod history;

pub use self::history::{CallHistory, CallRecord, HistorySnapshot};

use crate::invoker::Invoker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One unit of work: call `target_url` after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCall {
    pub target_url: String,
    pub delay: Duration,
}

impl ScheduledCall {
    pub fn new(target_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            target_url: target_url.into(),
            delay,
        }
    }
}

/// Spawns scheduled units. Cheap to clone; clones share the invoker,
/// history and in-flight counter.
#[derive(Clone)]
pub struct Scheduler {
    invoker: Arc<dyn Invoker>,
    history: CallHistory,
    in_flight: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new(invoker: Arc<dyn Invoker>, history: CallHistory) -> Self {
        Self {
            invoker,
            history,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start an independent unit for `call` and return immediately.
    ///
    /// Must be called from within a tokio runtime. Units cannot be
    /// cancelled and are never de-duplicated.
    pub fn schedule(&self, call: ScheduledCall) {
        info!(url = %call.target_url, delay_secs = call.delay.as_secs(), "Scheduling delayed call");

        let invoker = Arc::clone(&self.invoker);
        let history = self.history.clone();
        let guard = InFlight::enter(Arc::clone(&self.in_flight));

        tokio::spawn(async move {
            let _guard = guard;
            engine::run_unit(call, invoker.as_ref(), &history).await;
        });
    }

    /// Units scheduled but not yet recorded.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    pub fn invoker(&self) -> Arc<dyn Invoker> {
        Arc::clone(&self.invoker)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{PanickingInvoker, StubInvoker};
    use super::*;
    use crate::invoker::{Outcome, ResponseBody};
    use serde_json::json;

    fn scheduler_with(invoker: impl Invoker + 'static) -> Scheduler {
        Scheduler::new(Arc::new(invoker), CallHistory::new())
    }

    #[tokio::test]
    async fn test_zero_delay_records_json_success() {
        let scheduler = scheduler_with(StubInvoker::json(200, json!({ "ok": true })));
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/y", Duration::ZERO));
        rx.wait_for(|n| *n == 1).await.unwrap();

        let snap = scheduler.history().snapshot().await;
        assert_eq!(snap.total_count, 1);
        let record = &snap.records[0];
        assert_eq!(record.url, "http://x/y");
        assert_eq!(
            record.outcome,
            Outcome::Success {
                status_code: 200,
                body: ResponseBody::Json(json!({ "ok": true })),
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_still_success() {
        let scheduler = scheduler_with(StubInvoker::returning(Outcome::Success {
            status_code: 500,
            body: ResponseBody::Text("Internal Server Error".into()),
        }));
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/fail", Duration::ZERO));
        rx.wait_for(|n| *n == 1).await.unwrap();

        let snap = scheduler.history().snapshot().await;
        assert!(matches!(
            snap.records[0].outcome,
            Outcome::Success { status_code: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_recorded() {
        let scheduler = scheduler_with(StubInvoker::returning(Outcome::failure("connection refused")));
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/down", Duration::ZERO));
        rx.wait_for(|n| *n == 1).await.unwrap();

        let snap = scheduler.history().snapshot().await;
        let v = serde_json::to_value(&snap.records[0]).unwrap();
        assert_eq!(v["error_message"], "connection refused");
        assert!(v.get("status_code").is_none());
        assert!(v.get("body").is_none());
    }

    #[tokio::test]
    async fn test_invoker_panic_is_contained() {
        let scheduler = scheduler_with(PanickingInvoker);
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/panic", Duration::ZERO));
        rx.wait_for(|n| *n == 1).await.unwrap();

        let snap = scheduler.history().snapshot().await;
        match &snap.records[0].outcome {
            Outcome::Failure { error_message } => {
                assert!(error_message.contains("stub exploded"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_waits_for_delay() {
        let stub = Arc::new(StubInvoker::json(200, json!({})));
        let scheduler = Scheduler::new(stub.clone(), CallHistory::new());
        let mut rx = scheduler.history().subscribe();
        let start = tokio::time::Instant::now();

        scheduler.schedule(ScheduledCall::new("http://x/later", Duration::from_secs(300)));
        assert_eq!(scheduler.in_flight(), 1);

        tokio::time::advance(Duration::from_secs(299)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(stub.calls().is_empty());
        assert!(scheduler.history().is_empty().await);

        rx.wait_for(|n| *n == 1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(300));
        assert_eq!(stub.calls(), ["http://x/later"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_follows_delay_not_schedule_order() {
        let scheduler = scheduler_with(StubInvoker::json(200, json!({})));
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/slow", Duration::from_secs(60)));
        scheduler.schedule(ScheduledCall::new("http://x/fast", Duration::from_secs(10)));
        rx.wait_for(|n| *n == 2).await.unwrap();

        let snap = scheduler.history().snapshot().await;
        assert_eq!(snap.records[0].url, "http://x/fast");
        assert_eq!(snap.records[1].url, "http://x/slow");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_schedules_each_record_once() {
        let scheduler = scheduler_with(StubInvoker::json(200, json!({})));
        scheduler
            .history()
            .append(CallRecord::new("http://x/pre", Outcome::failure("earlier")))
            .await;
        let mut rx = scheduler.history().subscribe();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let s = scheduler.clone();
                tokio::spawn(async move {
                    // Duplicate URLs are independent units.
                    let url = format!("http://x/{}", i % 5);
                    s.schedule(ScheduledCall::new(url, Duration::from_millis(5)));
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        rx.wait_for(|n| *n == 21).await.unwrap();
        let snap = scheduler.history().snapshot().await;
        assert_eq!(snap.total_count, 21);
        for i in 0..5 {
            let url = format!("http://x/{}", i);
            assert_eq!(snap.records.iter().filter(|r| r.url == url).count(), 4);
        }
    }

    #[tokio::test]
    async fn test_in_flight_returns_to_zero() {
        let scheduler = scheduler_with(StubInvoker::json(204, json!(null)));
        let mut rx = scheduler.history().subscribe();

        scheduler.schedule(ScheduledCall::new("http://x/a", Duration::ZERO));
        scheduler.schedule(ScheduledCall::new("http://x/b", Duration::ZERO));
        rx.wait_for(|n| *n == 2).await.unwrap();

        // The guard drops just after the append.
        for _ in 0..10 {
            if scheduler.in_flight() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(scheduler.in_flight(), 0);
    }
}
