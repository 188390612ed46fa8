// Catering Backend - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod db;
pub mod error;
pub mod entities;
pub mod registry;
pub mod association;    // Dish -> client + cooks
pub mod billing;        // Total payable per client
pub mod classification; // Calorie tier per client
pub mod lookup;         // Dishes by client name
pub mod reporting;      // Periodic cook report
pub mod import;
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use db::{setup_database, Event, SharedDb};
pub use error::{CateringError, Result};
pub use entities::{
    Category, Classification, Client, Cook, Dish, NewClient, NewCook, NewDish,
};
pub use registry::{get_client, get_cook, register_client, register_cook};
pub use association::{assign_dish, attach_cook};
pub use billing::total_payable;
pub use classification::{classify, recompute_classification, IDEAL_CALORIES};
pub use lookup::dishes_by_client_name;
pub use reporting::{qualifies, qualifying_cooks, run_scan, SCAN_INTERVAL};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
