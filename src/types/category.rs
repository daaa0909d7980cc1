//! Category type for the card ledger engine
//!
//! The engine only ever touches one category: the shared "Card Invoice"
//! system category, looked up by name or auto-created on first use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category identifier
pub type CategoryId = u32;

/// Name of the system category every invoice is filed under
pub const INVOICE_CATEGORY: &str = "Card Invoice";

/// A transaction category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The category ID
    pub id: CategoryId,

    /// Display name
    pub name: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
