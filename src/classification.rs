// ⚖️ Classification Engine - calorie tier per client
//
// Calories are compared in integer hundredths, which makes the IDEAL tier
// (exactly 2000) reachable deterministically.

use rusqlite::Connection;
use serde_json::json;
use std::cmp::Ordering;
use tracing::info;

use crate::db::{self, Event};
use crate::entities::{from_hundredths, Classification};
use crate::error::{CateringError, Result};

/// Calorie sum that maps to IDEAL
pub const IDEAL_CALORIES: f64 = 2000.0;

const IDEAL_CALORIES_HUNDREDTHS: i64 = 200_000;

/// Below the threshold is LOW, exactly on it IDEAL, above it HIGH
pub fn classify(calories_hundredths: i64) -> Classification {
    match calories_hundredths.cmp(&IDEAL_CALORIES_HUNDREDTHS) {
        Ordering::Less => Classification::Low,
        Ordering::Equal => Classification::Ideal,
        Ordering::Greater => Classification::High,
    }
}

/// Recompute the client's tier from its dishes and persist it.
pub fn recompute_classification(conn: &mut Connection, client_id: i64) -> Result<Classification> {
    let tx = conn.transaction()?;

    let client =
        db::get_client(&tx, client_id)?.ok_or_else(|| CateringError::client_not_found(client_id))?;
    let calories = db::calorie_sum_hundredths(&tx, client_id)?;
    let tier = classify(calories);

    db::update_classification(&tx, client_id, tier)?;
    if client.classification != Some(tier) {
        db::insert_event(
            &tx,
            &Event::new(
                "classification_changed",
                "client",
                client_id,
                json!({
                    "from": client.classification,
                    "to": tier,
                    "calories": from_hundredths(calories),
                }),
            ),
        )?;
    }
    tx.commit()?;

    info!(
        client_id,
        calories = from_hundredths(calories),
        classification = %tier,
        "Client classification recomputed"
    );
    Ok(tier)
}
