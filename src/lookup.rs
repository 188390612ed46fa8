// 🔎 Dish lookup by client name

use rusqlite::Connection;
use tracing::{info, warn};

use crate::db;
use crate::entities::Dish;
use crate::error::{CateringError, Result};

/// All dishes of the client named exactly `first_name last_name`.
///
/// Names are compared verbatim (case-sensitive). When several clients share
/// the pair, the earliest registered one wins. A client without dishes yields
/// an empty list; an unknown pair is `ClientNameNotFound`.
pub fn dishes_by_client_name(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<Vec<Dish>> {
    info!(first_name, last_name, "Looking up dishes by client name");

    let client = match db::find_client_by_name(conn, first_name, last_name)? {
        Some(client) => client,
        None => {
            warn!(first_name, last_name, "Client not found");
            return Err(CateringError::ClientNameNotFound {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            });
        }
    };

    let dishes = db::get_dishes_for_client(conn, client.id)?;
    info!(client_id = client.id, count = dishes.len(), "Dishes found for client");

    Ok(dishes)
}
