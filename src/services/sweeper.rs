// src/services/sweeper.rs

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::repository::CartRepository;

/// Counts reported by one sweep run. A phase that failed reports `None`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
  pub marked: Option<u64>,
  pub purged: Option<u64>,
}

/// One sweep over the store: mark idle active carts as abandoned, then purge
/// carts abandoned past the retention threshold.
///
/// A pure function of (`now`, thresholds, store), so the timer loop and the
/// tests share the exact same entrypoint. Each phase reads the store through
/// a fresh predicate query; a cart marked in this run acquires
/// `abandoned_at = now`, which can never be older than the retention cutoff,
/// so mark and purge cannot hit the same cart in one run. A failing phase is
/// logged and does not block the other; errors never propagate to the
/// scheduler trigger.
#[instrument(name = "sweeper::run_sweep", skip(carts))]
pub async fn run_sweep(
  carts: &dyn CartRepository,
  now: DateTime<Utc>,
  idle_after: Duration,
  purge_after: Duration,
) -> SweepReport {
  let mut report = SweepReport::default();

  match carts.mark_idle_as_abandoned(now - idle_after, now).await {
    Ok(marked) => {
      info!("Marked {} carts as abandoned", marked);
      report.marked = Some(marked);
    }
    Err(e) => error!(error = %e, "Abandonment mark phase failed"),
  }

  match carts.purge_abandoned_before(now - purge_after).await {
    Ok(purged) => {
      info!("Removed {} old abandoned carts", purged);
      report.purged = Some(purged);
    }
    Err(e) => error!(error = %e, "Abandoned cart purge phase failed"),
  }

  report
}

/// Background task driving [`run_sweep`] on the configured cadence.
pub async fn run_sweep_loop(carts: Arc<dyn CartRepository>, config: Arc<AppConfig>) {
  info!(interval_secs = config.sweep_interval_secs, "Cart sweeper loop started");
  let mut ticker = tokio::time::interval(StdDuration::from_secs(config.sweep_interval_secs));
  // The first tick fires immediately; that run is as valid as any other.
  loop {
    ticker.tick().await;
    run_sweep(carts.as_ref(), Utc::now(), config.cart_idle_after, config.cart_purge_after).await;
  }
}
