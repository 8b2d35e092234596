//! User profile upsert and lookup.

use std::sync::Arc;

use chrono::Utc;
use food_order_core::{Email, EmailError, UserId};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::db::{DocumentStore, Fields, StoreError, USERS, encode};
use crate::models::{Identity, UserProfile};

/// Errors that can occur during profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The name is missing or blank.
    #[error("name is required")]
    MissingName,

    /// The email is not a valid address.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No profile exists for the user.
    #[error("profile not found")]
    NotFound,

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Body of a profile upsert request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Creates, merges and reads user profiles.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    /// Create a profile service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create or merge the caller's profile.
    ///
    /// The email defaults to the one on the caller's identity; an existing
    /// email is kept if neither is available. `createdAt` survives updates.
    ///
    /// # Errors
    ///
    /// - `ProfileError::MissingName` if the name is missing or blank (no side effects)
    /// - `ProfileError::InvalidEmail` if the email is malformed (no side effects)
    /// - `ProfileError::Store` if the write fails
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id))]
    pub async fn upsert(
        &self,
        identity: &Identity,
        request: UpsertProfileRequest,
    ) -> Result<UserProfile, ProfileError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ProfileError::MissingName)?
            .to_string();

        let email = request
            .email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .or(identity.email.as_deref())
            .map(Email::parse)
            .transpose()?;

        let user_id = identity.user_id.clone();
        let now = Utc::now();

        let document = self
            .store
            .transact(
                USERS,
                identity.user_id.as_str(),
                Box::new(move |current: Option<&Fields>| {
                    let existing = current
                        .map(|fields| fields_to_profile(fields, &user_id))
                        .transpose()?;

                    let profile = UserProfile {
                        user_id: user_id.clone(),
                        name: name.clone(),
                        email: email
                            .clone()
                            .or_else(|| existing.as_ref().and_then(|p| p.email.clone())),
                        created_at: existing.as_ref().map_or(now, |p| p.created_at),
                        updated_at: now,
                    };
                    encode(&profile)
                }),
            )
            .await?;

        let profile = fields_to_profile(&document.fields, &identity.user_id)?;
        tracing::info!("Profile saved");
        Ok(profile)
    }

    /// The caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if no profile exists.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: &UserId) -> Result<UserProfile, ProfileError> {
        let document = self
            .store
            .get(USERS, user_id.as_str())
            .await?
            .ok_or(ProfileError::NotFound)?;

        Ok(fields_to_profile(&document.fields, user_id)?)
    }
}

/// Decode a stored profile, taking the user id from the document key.
fn fields_to_profile(fields: &Fields, user_id: &UserId) -> Result<UserProfile, StoreError> {
    let mut fields = fields.clone();
    fields.insert("userId".to_string(), Value::String(user_id.to_string()));
    serde_json::from_value(Value::Object(fields)).map_err(|e| {
        StoreError::DataCorruption(format!("profile {user_id} does not decode: {e}"))
    })
}
