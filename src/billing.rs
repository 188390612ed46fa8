// 💶 Billing Aggregator
//
// Totals are summed in integer hundredths and converted once at the end, so
// a bill never drifts by floating-point error.

use rusqlite::Connection;
use tracing::debug;

use crate::db;
use crate::entities::from_hundredths;
use crate::error::{CateringError, Result};

/// Sum of the prices of every dish owned by the client. No dishes means 0.
pub fn total_payable(conn: &mut Connection, client_id: i64) -> Result<f64> {
    let tx = conn.transaction()?;

    if db::get_client(&tx, client_id)?.is_none() {
        return Err(CateringError::client_not_found(client_id));
    }
    let total = db::price_sum_hundredths(&tx, client_id)?;
    tx.commit()?;

    debug!(client_id, total_hundredths = total, "Computed total payable");
    Ok(from_hundredths(total))
}
