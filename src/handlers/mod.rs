// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod demo;
mod health;
mod items;
mod metrics;
mod root;

// Core handlers
pub use health::health_check;
pub use metrics::{metrics_handler, PROMETHEUS_CONTENT_TYPE};
pub use root::root_handler;

// Demo handlers
pub use demo::{get_data, not_found, simulate_error, slow_endpoint};

// Item CRUD handlers
pub use items::{create_item, delete_item, get_item, list_items, update_item};
