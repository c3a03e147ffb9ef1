//! Startup ritual: the integrity gate consulted before serving traffic.

use aether_core::AetherConfig;
use aether_state::{GemFilter, GemStore};
use tracing::{error, info};

/// Matches no gem; used only to prove the store answers queries.
fn probe_filter() -> GemFilter {
    GemFilter {
        synced_at_or_before: None,
        usage_below: Some(0),
    }
}

/// Returns `false` when the host must not serve: invalid configuration or an
/// unreachable store.
pub async fn perform_startup_ritual(config: &AetherConfig, store: &dyn GemStore) -> bool {
    info!("initiating startup ritual");

    if let Err(e) = config.validate() {
        error!(error = %e, "configuration rejected, halting");
        return false;
    }

    if let Err(e) = store.scan(&probe_filter()).await {
        error!(error = %e, "gem store unreachable, halting");
        return false;
    }

    info!(
        persist_path = %config.persist_path.display(),
        retention_days = config.retention_days,
        min_usage = config.min_usage_threshold,
        "startup ritual complete, system is awake"
    );
    true
}
