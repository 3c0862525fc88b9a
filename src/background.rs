use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Periodic reconcile sweep. Read paths already correct stale statuses on
/// their own; this keeps rows fresh for events nobody is looking at.
pub async fn start_status_sweep(state: Arc<AppState>) {
    info!("Starting event status sweep...");

    loop {
        match state.event_service.reconcile_all().await {
            Ok(0) => {}
            Ok(changed) => info!("Status sweep reconciled {} events", changed),
            Err(e) => error!("Status sweep failed: {:?}", e),
        }
        sleep(Duration::from_secs(SWEEP_INTERVAL_SECS)).await;
    }
}
