//! User profiles.

use chrono::{DateTime, Utc};
use food_order_core::{Email, UserId};
use serde::{Deserialize, Serialize};

/// A user profile, keyed by user id in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    /// Display name, never blank.
    pub name: String,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(with = "food_order_core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "food_order_core::timestamp")]
    pub updated_at: DateTime<Utc>,
}
