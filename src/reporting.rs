// 📋 Periodic Reporting Scan - busy cooks with a main course
//
// A cook qualifies with at least two dishes, one of them MAIN. The scan only
// reads and only logs; failures are logged and swallowed.

use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

use crate::db;
use crate::entities::{Category, Cook};
use crate::error::Result;

/// Default delay between two scans
pub const SCAN_INTERVAL: Duration = Duration::from_secs(15);

/// Minimum number of dishes for a cook to be reported
pub const MIN_DISHES: usize = 2;

/// `categories` holds one entry per dish the cook participates in
pub fn qualifies(categories: &[Category]) -> bool {
    categories.len() >= MIN_DISHES && categories.contains(&Category::Main)
}

/// Every qualifying cook, each once, ordered by id
pub fn qualifying_cooks(conn: &Connection) -> Result<Vec<Cook>> {
    let cooks = db::get_cooks_with_categories(conn)?
        .into_iter()
        .filter(|(_, categories)| qualifies(categories))
        .map(|(cook, _)| cook)
        .collect();

    Ok(cooks)
}

/// Run one scan and log every qualifying cook's first name.
/// Never fails: errors end up in the log and yield an empty report.
pub fn run_scan(db: &Mutex<Connection>) -> Vec<Cook> {
    let conn = match db.lock() {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "Cook report skipped: database lock poisoned");
            return Vec::new();
        }
    };

    match qualifying_cooks(&conn) {
        Ok(cooks) => {
            for cook in &cooks {
                info!(cook_id = cook.id, "Cook with a main course among several dishes: {}", cook.first_name);
            }
            cooks
        }
        Err(e) => {
            warn!(error = %e, "Cook report scan failed");
            Vec::new()
        }
    }
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

#[cfg(feature = "server")]
mod task {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;
    use tokio::time::{interval_at, Instant, MissedTickBehavior};
    use tracing::{debug, warn};

    use super::run_scan;
    use crate::db::SharedDb;

    /// Run the scan every `period`, first one `period` after start, until a
    /// shutdown signal arrives or the sender is dropped.
    pub fn spawn_reporting_task(
        db: SharedDb,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let db = Arc::clone(&db);
                        // SQLite calls block; keep them off the async workers
                        if let Err(e) = tokio::task::spawn_blocking(move || run_scan(&db)).await {
                            warn!(error = %e, "Cook report task panicked");
                        }
                    }
                    _ = shutdown.recv() => {
                        debug!("Cook report task received shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(feature = "server")]
pub use task::spawn_reporting_task;
