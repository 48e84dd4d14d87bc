//! callcycle -- a self-sustaining HTTP call cycle.
//!
//! Two endpoints each schedule a delayed outbound call to the other. Every
//! scheduled call runs as its own task and records its outcome in a shared,
//! append-only call history that the service exposes over HTTP.

pub mod api;
pub mod clock;
pub mod config;
pub mod invoker;
pub mod scheduler;

use anyhow::Result;
use std::sync::Arc;

use self::api::state::AppState;
use self::config::CycleConfig;
use self::invoker::{HttpInvoker, Invoker};
use self::scheduler::{CallHistory, Scheduler};

/// The wired service: one history, one scheduler, one router.
pub struct Service {
    state: AppState,
}

impl Service {
    /// Wire the service with the real reqwest-backed invoker.
    pub fn new(config: &CycleConfig) -> Result<Self> {
        let invoker = HttpInvoker::new()?;
        Ok(Self::with_invoker(config, Arc::new(invoker)))
    }

    pub fn with_invoker(config: &CycleConfig, invoker: Arc<dyn Invoker>) -> Self {
        let scheduler = Scheduler::new(invoker, CallHistory::new());
        Self {
            state: AppState::new(scheduler, config.cycle.clone()),
        }
    }

    pub fn history(&self) -> CallHistory {
        self.state.scheduler.history().clone()
    }

    pub fn router(&self) -> axum::Router {
        api::router(self.state.clone())
    }

    /// Serve on an already-bound listener until Ctrl-C.
    pub async fn run(self, listener: tokio::net::TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "callcycle listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!(
            pending = self.state.scheduler.in_flight(),
            "Server stopped, dropping pending scheduled calls"
        );
        Ok(())
    }
}

/// Validate `config`, bind its listener and serve.
pub async fn serve(config: CycleConfig) -> Result<()> {
    config.validate()?;
    let addr = config.server.bind_addr()?;

    tracing::info!(
        endpoint_a = %config.cycle.endpoint_a_url,
        endpoint_b = %config.cycle.endpoint_b_url,
        delay_secs = config.cycle.delay_secs,
        "Starting callcycle"
    );

    let service = Service::new(&config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    service.run(listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
