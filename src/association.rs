// 🔗 Association Manager - link dishes to their client and cooks
//
// Lookups fail fast: a missing client or cook is a NotFound and nothing is
// persisted.

use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::db::{self, Event};
use crate::entities::{Dish, NewDish};
use crate::error::{CateringError, Result};

/// Create `dish`, owned by `client_id` and prepared by `cook_id`, in one
/// unit of work. Returns the stored dish.
pub fn assign_dish(
    conn: &mut Connection,
    dish: &NewDish,
    client_id: i64,
    cook_id: i64,
) -> Result<Dish> {
    dish.validate()?;

    let tx = conn.transaction()?;

    let client =
        db::get_client(&tx, client_id)?.ok_or_else(|| CateringError::client_not_found(client_id))?;
    let cook = db::get_cook(&tx, cook_id)?.ok_or_else(|| CateringError::cook_not_found(cook_id))?;

    let dish_id = db::insert_dish(&tx, dish, client.id)?;
    db::link_cook(&tx, dish_id, cook.id)?;
    db::insert_event(
        &tx,
        &Event::new(
            "dish_assigned",
            "dish",
            dish_id,
            json!({
                "label": dish.label,
                "category": dish.category,
                "client_id": client.id,
                "cook_id": cook.id,
            }),
        ),
    )?;

    let stored = db::get_dish(&tx, dish_id)?.ok_or_else(|| CateringError::dish_not_found(dish_id))?;
    tx.commit()?;

    info!(
        dish_id,
        client_id = client.id,
        cook_id = cook.id,
        label = %stored.label,
        "Dish assigned to client and cook"
    );
    Ok(stored)
}

/// Add another participating cook to an existing dish. Linking a cook that
/// is already on the dish changes nothing.
pub fn attach_cook(conn: &mut Connection, dish_id: i64, cook_id: i64) -> Result<Dish> {
    let tx = conn.transaction()?;

    if db::get_dish(&tx, dish_id)?.is_none() {
        return Err(CateringError::dish_not_found(dish_id));
    }
    if db::get_cook(&tx, cook_id)?.is_none() {
        return Err(CateringError::cook_not_found(cook_id));
    }

    let added = db::link_cook(&tx, dish_id, cook_id)?;
    if added {
        db::insert_event(
            &tx,
            &Event::new("cook_attached", "dish", dish_id, json!({ "cook_id": cook_id })),
        )?;
    }

    let stored = db::get_dish(&tx, dish_id)?.ok_or_else(|| CateringError::dish_not_found(dish_id))?;
    tx.commit()?;

    if added {
        info!(dish_id, cook_id, "Cook attached to dish");
    }
    Ok(stored)
}
