// Registration - create and fetch clients and cooks
//
// Each registration writes the record and its audit event in one
// transaction. `record_*` do the writes inside a transaction owned by the
// caller, which lets a bulk import commit all rows at once.

use rusqlite::{Connection, Transaction};
use serde_json::json;
use tracing::info;

use crate::db::{self, Event};
use crate::entities::{Client, Cook, NewClient, NewCook};
use crate::error::{CateringError, Result};

pub fn register_client(conn: &mut Connection, client: &NewClient) -> Result<Client> {
    client.validate()?;

    let tx = conn.transaction()?;
    let stored = record_client(&tx, client)?;
    tx.commit()?;

    info!(client_id = stored.id, name = %stored.full_name(), "Registered client");
    Ok(stored)
}

pub fn register_cook(conn: &mut Connection, cook: &NewCook) -> Result<Cook> {
    cook.validate()?;

    let tx = conn.transaction()?;
    let stored = record_cook(&tx, cook)?;
    tx.commit()?;

    info!(cook_id = stored.id, first_name = %stored.first_name, "Registered cook");
    Ok(stored)
}

/// Insert a validated client and its audit event inside the caller's transaction
pub(crate) fn record_client(tx: &Transaction<'_>, client: &NewClient) -> Result<Client> {
    let stored = db::insert_client(tx, client)?;
    db::insert_event(
        tx,
        &Event::new(
            "client_registered",
            "client",
            stored.id,
            json!({ "first_name": stored.first_name, "last_name": stored.last_name }),
        ),
    )?;
    Ok(stored)
}

/// Insert a validated cook and its audit event inside the caller's transaction
pub(crate) fn record_cook(tx: &Transaction<'_>, cook: &NewCook) -> Result<Cook> {
    let stored = db::insert_cook(tx, cook)?;
    db::insert_event(
        tx,
        &Event::new(
            "cook_registered",
            "cook",
            stored.id,
            json!({ "first_name": stored.first_name, "last_name": stored.last_name }),
        ),
    )?;
    Ok(stored)
}

pub fn get_client(conn: &Connection, id: i64) -> Result<Client> {
    db::get_client(conn, id)?.ok_or_else(|| CateringError::client_not_found(id))
}

pub fn get_cook(conn: &Connection, id: i64) -> Result<Cook> {
    db::get_cook(conn, id)?.ok_or_else(|| CateringError::cook_not_found(id))
}
