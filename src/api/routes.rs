//! Route definitions for the call cycle.

use super::state::AppState;
use crate::clock;
use crate::config::CyclePeers;
use crate::invoker::{Outcome, ResponseBody};
use crate::scheduler::ScheduledCall;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "Call Cycle Service";

pub fn cycle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/endpoint-a", get(endpoint_a))
        .route("/endpoint-b", get(endpoint_b))
        .route("/call-history", get(call_history))
        .route("/start-cycle", get(start_cycle))
}

/// The two halves of the cycle. Each schedules a call to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    A,
    B,
}

impl Endpoint {
    fn peer(self) -> Self {
        match self {
            Endpoint::A => Endpoint::B,
            Endpoint::B => Endpoint::A,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Endpoint::A => "Endpoint A",
            Endpoint::B => "Endpoint B",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Endpoint::A => "endpoint-a",
            Endpoint::B => "endpoint-b",
        }
    }

    fn url(self, peers: &CyclePeers) -> &str {
        match self {
            Endpoint::A => &peers.endpoint_a_url,
            Endpoint::B => &peers.endpoint_b_url,
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": format!("Welcome to the {}!", SERVICE_NAME) }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": clock::timestamp(),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn endpoint_a(State(state): State<AppState>) -> Json<Value> {
    acknowledge(&state, Endpoint::A)
}

async fn endpoint_b(State(state): State<AppState>) -> Json<Value> {
    acknowledge(&state, Endpoint::B)
}

/// Schedule the call to `endpoint`'s peer and return without waiting on it.
fn acknowledge(state: &AppState, endpoint: Endpoint) -> Json<Value> {
    let peer = endpoint.peer();
    let target = peer.url(&state.peers).to_string();
    let delay = state.peers.delay();

    state
        .scheduler
        .schedule(ScheduledCall::new(target.clone(), delay));

    let timestamp = clock::timestamp();
    let delay_text = clock::describe(delay);
    info!(
        endpoint = endpoint.slug(),
        %timestamp,
        url = %target,
        "{} called, scheduled call to {} in {}",
        endpoint.label(),
        peer.label(),
        delay_text
    );

    Json(json!({
        "message": format!("{} called successfully", endpoint.label()),
        "timestamp": timestamp,
        "scheduled_call": format!("Will call {} at {} in {}", peer.label(), target, delay_text),
        "next_endpoint": peer.slug()
    }))
}

async fn call_history(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.scheduler.history().snapshot().await;
    Json(json!({
        "call_history": snapshot.records,
        "total_calls": snapshot.total_count,
        "pending_calls": state.scheduler.in_flight(),
        "timestamp": clock::timestamp()
    }))
}

/// Call endpoint-a once, right now, and relay its acknowledgment.
///
/// This goes through the HTTP interface, not the scheduler, so nothing is
/// appended to the history here. The reply is read as JSON whatever its
/// content-type says.
async fn start_cycle(State(state): State<AppState>) -> Json<Value> {
    let target = Endpoint::A.url(&state.peers);
    let outcome = state.scheduler.invoker().invoke(target).await;

    let parsed = match outcome {
        Outcome::Success {
            body: ResponseBody::Json(response),
            ..
        } => Ok(response),
        Outcome::Success {
            body: ResponseBody::Text(text),
            status_code,
        } => serde_json::from_str::<Value>(&text).map_err(|e| {
            format!(
                "{} returned a non-JSON response (status {}): {}",
                target, status_code, e
            )
        }),
        Outcome::Failure { error_message } => Err(error_message),
    };

    match parsed {
        Ok(response) => {
            info!(url = %target, "Cycle started");
            Json(json!({
                "message": "Cycle started successfully",
                "timestamp": clock::timestamp(),
                "initial_call_response": response
            }))
        }
        Err(error) => {
            warn!(url = %target, error = %error, "Failed to start cycle");
            Json(json!({
                "message": "Failed to start cycle",
                "timestamp": clock::timestamp(),
                "error": error
            }))
        }
    }
}
