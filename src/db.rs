// Catering store - SQLite persistence for clients, cooks, dishes and events
//
// Lookups return Option; callers decide whether absence is a NotFound.
// Every function takes a plain &Connection so it can run inside a
// rusqlite::Transaction (which derefs to Connection).

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::entities::{from_hundredths, Category, Classification, Client, Cook, Dish, NewClient, NewCook, NewDish};
use crate::error::Result;

/// One connection shared by request handlers and the report task
pub type SharedDb = Arc<Mutex<Connection>>;

/// Actor recorded on events written by this service
pub const ACTOR: &str = "catering";

/// Event for audit trail: every registration, assignment and tier change
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: i64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: ACTOR.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> anyhow::Result<()> {
    // WAL for crash recovery on file databases; a no-op in memory
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Entity tables
    // Price and calories are INTEGER hundredths
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            classification TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cooks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS dishes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            price_hundredths INTEGER NOT NULL CHECK (price_hundredths >= 0),
            calories_hundredths INTEGER NOT NULL CHECK (calories_hundredths >= 0),
            category TEXT NOT NULL,
            client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Dish side owns the many-to-many relation
    conn.execute(
        "CREATE TABLE IF NOT EXISTS dish_cooks (
            dish_id INTEGER NOT NULL REFERENCES dishes(id) ON DELETE CASCADE,
            cook_id INTEGER NOT NULL REFERENCES cooks(id) ON DELETE CASCADE,
            PRIMARY KEY (dish_id, cook_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(first_name, last_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_dishes_client ON dishes(client_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_dish_cooks_cook ON dish_cooks(cook_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn conversion_error(column: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let classification: Option<String> = row.get(3)?;
    let classification = classification
        .map(|s| s.parse::<Classification>())
        .transpose()
        .map_err(|e| conversion_error(3, e))?;

    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        classification,
    })
}

fn cook_from_row(row: &Row<'_>) -> rusqlite::Result<Cook> {
    Ok(Cook {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
    })
}

fn category_from_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Category> {
    let raw: String = row.get(column)?;
    raw.parse::<Category>().map_err(|e| conversion_error(column, e))
}

/// Dish row without its cook ids; those come from dish_cooks
fn dish_from_row(row: &Row<'_>) -> rusqlite::Result<Dish> {
    Ok(Dish {
        id: row.get(0)?,
        label: row.get(1)?,
        price: from_hundredths(row.get(2)?),
        calories: from_hundredths(row.get(3)?),
        category: category_from_column(row, 4)?,
        client_id: row.get(5)?,
        cook_ids: Vec::new(),
    })
}

const DISH_COLUMNS: &str =
    "id, label, price_hundredths, calories_hundredths, category, client_id";

// ============================================================================
// CLIENTS
// ============================================================================

pub fn insert_client(conn: &Connection, client: &NewClient) -> Result<Client> {
    conn.execute(
        "INSERT INTO clients (first_name, last_name) VALUES (?1, ?2)",
        params![client.first_name, client.last_name],
    )?;

    Ok(Client {
        id: conn.last_insert_rowid(),
        first_name: client.first_name.clone(),
        last_name: client.last_name.clone(),
        classification: None,
    })
}

pub fn get_client(conn: &Connection, id: i64) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT id, first_name, last_name, classification FROM clients WHERE id = ?1",
            [id],
            client_from_row,
        )
        .optional()?;

    Ok(client)
}

/// Exact, case-sensitive match. Duplicate name pairs resolve to the lowest id.
pub fn find_client_by_name(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT id, first_name, last_name, classification FROM clients
             WHERE first_name = ?1 AND last_name = ?2
             ORDER BY id
             LIMIT 1",
            params![first_name, last_name],
            client_from_row,
        )
        .optional()?;

    Ok(client)
}

pub fn update_classification(
    conn: &Connection,
    client_id: i64,
    classification: Classification,
) -> Result<()> {
    conn.execute(
        "UPDATE clients SET classification = ?1 WHERE id = ?2",
        params![classification.as_str(), client_id],
    )?;

    Ok(())
}

pub fn count_clients(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// COOKS
// ============================================================================

pub fn insert_cook(conn: &Connection, cook: &NewCook) -> Result<Cook> {
    conn.execute(
        "INSERT INTO cooks (first_name, last_name) VALUES (?1, ?2)",
        params![cook.first_name, cook.last_name],
    )?;

    Ok(Cook {
        id: conn.last_insert_rowid(),
        first_name: cook.first_name.clone(),
        last_name: cook.last_name.clone(),
    })
}

pub fn get_cook(conn: &Connection, id: i64) -> Result<Option<Cook>> {
    let cook = conn
        .query_row(
            "SELECT id, first_name, last_name FROM cooks WHERE id = ?1",
            [id],
            cook_from_row,
        )
        .optional()?;

    Ok(cook)
}

pub fn count_cooks(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM cooks", [], |row| row.get(0))?;
    Ok(count)
}

/// Full scan of cooks, each paired with the categories of the dishes it
/// participates in (one entry per dish, so the length is the dish count)
pub fn get_cooks_with_categories(conn: &Connection) -> Result<Vec<(Cook, Vec<Category>)>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.first_name, c.last_name, d.category
         FROM cooks c
         LEFT JOIN dish_cooks dc ON dc.cook_id = c.id
         LEFT JOIN dishes d ON d.id = dc.dish_id
         ORDER BY c.id, d.id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let cook = cook_from_row(row)?;
            let category: Option<String> = row.get(3)?;
            let category = category
                .map(|s| s.parse::<Category>())
                .transpose()
                .map_err(|e| conversion_error(3, e))?;
            Ok((cook, category))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut cooks: Vec<(Cook, Vec<Category>)> = Vec::new();
    for (cook, category) in rows {
        let same_cook = cooks.last().is_some_and(|(last, _)| last.id == cook.id);
        if same_cook {
            if let Some((_, categories)) = cooks.last_mut() {
                categories.extend(category);
            }
        } else {
            cooks.push((cook, category.into_iter().collect()));
        }
    }

    Ok(cooks)
}

// ============================================================================
// DISHES
// ============================================================================

/// Insert a dish owned by `client_id`; returns the new dish id
pub fn insert_dish(conn: &Connection, dish: &NewDish, client_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO dishes (
            label, price_hundredths, calories_hundredths, category, client_id
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            dish.label,
            dish.price_hundredths(),
            dish.calories_hundredths(),
            dish.category.as_str(),
            client_id,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Add a cook to a dish. Returns false when the cook was already linked.
pub fn link_cook(conn: &Connection, dish_id: i64, cook_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO dish_cooks (dish_id, cook_id) VALUES (?1, ?2)",
        params![dish_id, cook_id],
    )?;

    Ok(changed > 0)
}

fn cook_ids_for_dish(conn: &Connection, dish_id: i64) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT cook_id FROM dish_cooks WHERE dish_id = ?1 ORDER BY cook_id")?;

    let ids = stmt
        .query_map([dish_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;

    Ok(ids)
}

pub fn get_dish(conn: &Connection, id: i64) -> Result<Option<Dish>> {
    let dish = conn
        .query_row(
            &format!("SELECT {DISH_COLUMNS} FROM dishes WHERE id = ?1"),
            [id],
            dish_from_row,
        )
        .optional()?;

    match dish {
        Some(mut dish) => {
            dish.cook_ids = cook_ids_for_dish(conn, dish.id)?;
            Ok(Some(dish))
        }
        None => Ok(None),
    }
}

/// All dishes owned by a client, ordered by dish id
pub fn get_dishes_for_client(conn: &Connection, client_id: i64) -> Result<Vec<Dish>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DISH_COLUMNS} FROM dishes WHERE client_id = ?1 ORDER BY id"
    ))?;

    let mut dishes = stmt
        .query_map([client_id], dish_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for dish in &mut dishes {
        dish.cook_ids = cook_ids_for_dish(conn, dish.id)?;
    }

    Ok(dishes)
}

/// Exact integer sum of dish prices, in hundredths
pub fn price_sum_hundredths(conn: &Connection, client_id: i64) -> Result<i64> {
    let sum = conn.query_row(
        "SELECT COALESCE(SUM(price_hundredths), 0) FROM dishes WHERE client_id = ?1",
        [client_id],
        |row| row.get(0),
    )?;

    Ok(sum)
}

/// Exact integer sum of dish calories, in hundredths
pub fn calorie_sum_hundredths(conn: &Connection, client_id: i64) -> Result<i64> {
    let sum = conn.query_row(
        "SELECT COALESCE(SUM(calories_hundredths), 0) FROM dishes WHERE client_id = ?1",
        [client_id],
        |row| row.get(0),
    )?;

    Ok(sum)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: i64,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id.to_string()], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| conversion_error(1, e))?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_db();
        setup_database(&conn).unwrap();
        assert_eq!(count_clients(&conn).unwrap(), 0);
        assert_eq!(count_cooks(&conn).unwrap(), 0);
    }

    #[test]
    fn test_client_roundtrip_and_classification_update() {
        let conn = test_db();
        let client = insert_client(&conn, &NewClient::new("Ana", "Lee")).unwrap();

        let stored = get_client(&conn, client.id).unwrap().unwrap();
        assert_eq!(stored, client);
        assert!(stored.classification.is_none());

        update_classification(&conn, client.id, Classification::Ideal).unwrap();
        let stored = get_client(&conn, client.id).unwrap().unwrap();
        assert_eq!(stored.classification, Some(Classification::Ideal));

        assert!(get_client(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_find_client_by_name_is_exact_and_takes_first() {
        let conn = test_db();
        let first = insert_client(&conn, &NewClient::new("Ana", "Lee")).unwrap();
        insert_client(&conn, &NewClient::new("Ana", "Lee")).unwrap();

        let found = find_client_by_name(&conn, "Ana", "Lee").unwrap().unwrap();
        assert_eq!(found.id, first.id);

        assert!(find_client_by_name(&conn, "ana", "lee").unwrap().is_none());
        assert!(find_client_by_name(&conn, "Lee", "Ana").unwrap().is_none());
    }

    #[test]
    fn test_dish_links_and_sums() {
        let conn = test_db();
        let client = insert_client(&conn, &NewClient::new("Ana", "Lee")).unwrap();
        let cook = insert_cook(&conn, &NewCook::new("Sam", "Ortiz")).unwrap();

        let soup = NewDish::new("Soup", 5.0, 300.0, Category::Starter);
        let steak = NewDish::new("Steak", 18.5, 950.25, Category::Main);
        let soup_id = insert_dish(&conn, &soup, client.id).unwrap();
        let steak_id = insert_dish(&conn, &steak, client.id).unwrap();

        assert!(link_cook(&conn, soup_id, cook.id).unwrap());
        assert!(!link_cook(&conn, soup_id, cook.id).unwrap());

        let dish = get_dish(&conn, soup_id).unwrap().unwrap();
        assert_eq!(dish.cook_ids, vec![cook.id]);
        assert_eq!(dish.client_id, client.id);

        let dishes = get_dishes_for_client(&conn, client.id).unwrap();
        assert_eq!(dishes.iter().map(|d| d.id).collect::<Vec<_>>(), vec![soup_id, steak_id]);

        assert_eq!(price_sum_hundredths(&conn, client.id).unwrap(), 2350);
        assert_eq!(calorie_sum_hundredths(&conn, client.id).unwrap(), 125_025);
        assert_eq!(price_sum_hundredths(&conn, 999).unwrap(), 0);
    }

    #[test]
    fn test_dish_requires_existing_client() {
        let conn = test_db();
        let dish = NewDish::new("Soup", 5.0, 300.0, Category::Starter);
        assert!(insert_dish(&conn, &dish, 42).is_err());
    }

    #[test]
    fn test_cooks_with_categories_counts_each_dish() {
        let conn = test_db();
        let client = insert_client(&conn, &NewClient::new("Ana", "Lee")).unwrap();
        let busy = insert_cook(&conn, &NewCook::new("Sam", "Ortiz")).unwrap();
        let idle = insert_cook(&conn, &NewCook::new("Kim", "Park")).unwrap();

        for (label, category) in [("Soup", Category::Starter), ("Stew", Category::Main)] {
            let id = insert_dish(&conn, &NewDish::new(label, 1.0, 1.0, category), client.id).unwrap();
            link_cook(&conn, id, busy.id).unwrap();
        }

        let cooks = get_cooks_with_categories(&conn).unwrap();
        assert_eq!(cooks.len(), 2);
        assert_eq!(cooks[0].0.id, busy.id);
        assert_eq!(cooks[0].1, vec![Category::Starter, Category::Main]);
        assert_eq!(cooks[1].0.id, idle.id);
        assert!(cooks[1].1.is_empty());
    }

    #[test]
    fn test_event_log() {
        let conn = test_db();

        let event = Event::new(
            "client_registered",
            "client",
            7,
            serde_json::json!({"first_name": "Ana"}),
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "client", 7).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "client_registered");
        assert_eq!(events[0].actor, ACTOR);
        assert_eq!(events[0].data["first_name"], "Ana");

        assert!(get_events_for_entity(&conn, "cook", 7).unwrap().is_empty());
    }
}
