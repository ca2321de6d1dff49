mod item_models;
mod metrics;
mod repository;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose item abstractions
pub use item_models::{Item, NewItem};
pub use repository::{ItemRepository, ItemRepositoryPtr};
