use crate::config::CyclePeers;
use crate::scheduler::Scheduler;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    pub peers: Arc<CyclePeers>,
}

impl AppState {
    pub fn new(scheduler: Scheduler, peers: CyclePeers) -> Self {
        Self {
            scheduler,
            peers: Arc::new(peers),
        }
    }
}
