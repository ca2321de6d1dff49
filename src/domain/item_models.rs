use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored item as returned by the items API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    // ---
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or replacing an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    // ---
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
}

impl Item {
    // ---
    pub fn from_new(id: i64, item: NewItem) -> Self {
        // ---
        Self {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            created_at: Utc::now(),
        }
    }
}
