use super::history::{CallHistory, CallRecord};
use super::ScheduledCall;
use crate::clock;
use crate::invoker::{Invoker, Outcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info};

/// Execute one scheduled unit: wait, invoke, record.
///
/// Always appends exactly one record, even if the invoker panics.
pub async fn run_unit(call: ScheduledCall, invoker: &dyn Invoker, history: &CallHistory) {
    clock::wait(call.delay).await;

    let outcome = AssertUnwindSafe(invoker.invoke(&call.target_url))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Outcome::failure(format!("invoker panicked: {}", panic_message(&*panic)))
        });

    match &outcome {
        Outcome::Success { status_code, .. } => {
            info!(url = %call.target_url, status = %status_code, "Delayed call completed");
        }
        Outcome::Failure { error_message } => {
            error!(url = %call.target_url, error = %error_message, "Delayed call failed");
        }
    }

    history.append(CallRecord::new(call.target_url, outcome)).await;
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
