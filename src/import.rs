// CSV import of clients and cooks
//
// Expected headers: first_name,last_name. The whole file is parsed and
// validated first, then every row is registered in a single transaction:
// a file imports completely or not at all.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::entities::{NewClient, NewCook};
use crate::registry::{record_client, record_cook};

#[derive(Debug, Deserialize)]
struct PersonRecord {
    first_name: String,
    last_name: String,
}

fn load_people(csv_path: &Path) -> Result<Vec<PersonRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut people = Vec::new();
    // Line 1 is the header
    for (index, result) in rdr.deserialize().enumerate() {
        let record: PersonRecord =
            result.with_context(|| format!("Failed to parse CSV line {}", index + 2))?;
        people.push(record);
    }

    Ok(people)
}

pub fn import_clients(conn: &mut Connection, csv_path: &Path) -> Result<usize> {
    let clients: Vec<NewClient> = load_people(csv_path)?
        .into_iter()
        .map(|p| NewClient::new(p.first_name, p.last_name))
        .collect();

    for (index, client) in clients.iter().enumerate() {
        client
            .validate()
            .with_context(|| format!("Invalid client on CSV line {}", index + 2))?;
    }

    let tx = conn.transaction()?;
    for (index, client) in clients.iter().enumerate() {
        record_client(&tx, client)
            .with_context(|| format!("Failed to register client from CSV line {}", index + 2))?;
    }
    tx.commit()?;

    info!(count = clients.len(), path = %csv_path.display(), "Imported clients");
    Ok(clients.len())
}

pub fn import_cooks(conn: &mut Connection, csv_path: &Path) -> Result<usize> {
    let cooks: Vec<NewCook> = load_people(csv_path)?
        .into_iter()
        .map(|p| NewCook::new(p.first_name, p.last_name))
        .collect();

    for (index, cook) in cooks.iter().enumerate() {
        cook.validate()
            .with_context(|| format!("Invalid cook on CSV line {}", index + 2))?;
    }

    let tx = conn.transaction()?;
    for (index, cook) in cooks.iter().enumerate() {
        record_cook(&tx, cook)
            .with_context(|| format!("Failed to register cook from CSV line {}", index + 2))?;
    }
    tx.commit()?;

    info!(count = cooks.len(), path = %csv_path.display(), "Imported cooks");
    Ok(cooks.len())
}
