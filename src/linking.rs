//! Account linking gate
//!
//! Optionally binds an API key to an external user account. Token
//! validation is supplied by the embedding application through the
//! [`LinkingTokenValidator`] trait; without a configured validator the
//! whole surface answers 501 so callers can tell "not wired up" apart
//! from "bad token".

use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, configuration_missing, unauthorized};
use crate::models::account_link;
use crate::repositories::AccountLinkRepository;

/// Validates an opaque linking token and resolves it to an external
/// account id.
///
/// Implementations are provided by the embedding application (a session
/// store, a JWT verifier, a one-time-token table). A `Err(reason)` means
/// the token is invalid for this key; the reason is logged, not returned
/// to the caller.
#[async_trait]
pub trait LinkingTokenValidator: Send + Sync {
    async fn validate(&self, linking_token: &str, api_key_id: &Uuid) -> Result<String, String>;
}

/// Service enforcing the linking gate over the account link store
#[derive(Clone)]
pub struct LinkingService {
    links: AccountLinkRepository,
    validator: Option<Arc<dyn LinkingTokenValidator>>,
}

impl LinkingService {
    pub fn new(
        links: AccountLinkRepository,
        validator: Option<Arc<dyn LinkingTokenValidator>>,
    ) -> Self {
        Self { links, validator }
    }

    /// Validates a linking token and binds the key to the resolved account.
    ///
    /// Last write wins: re-linking a key replaces its existing link.
    pub async fn link(
        &self,
        api_key_id: &Uuid,
        linking_token: &str,
    ) -> Result<account_link::Model, ApiError> {
        let validator = self.validator.as_ref().ok_or_else(|| {
            configuration_missing(
                StatusCode::NOT_IMPLEMENTED,
                "Account linking is not configured",
            )
        })?;

        let external_account_id = match validator.validate(linking_token, api_key_id).await {
            Ok(account_id) => account_id,
            Err(reason) => {
                tracing::warn!(api_key_id = %api_key_id, %reason, "Linking token rejected");
                return Err(unauthorized(Some("Invalid linking token")));
            }
        };

        let link = self.links.upsert(api_key_id, &external_account_id).await?;

        tracing::info!(
            api_key_id = %api_key_id,
            external_account_id = %link.external_account_id,
            "API key linked to external account"
        );

        Ok(link)
    }

    /// Removes the link for a key; succeeds whether or not one existed
    pub async fn unlink(&self, api_key_id: &Uuid) -> Result<(), ApiError> {
        self.links.delete_by_key(api_key_id).await?;
        Ok(())
    }

    /// Returns the link for a key, if any
    pub async fn get(&self, api_key_id: &Uuid) -> Result<Option<account_link::Model>, ApiError> {
        Ok(self.links.find_by_key(api_key_id).await?)
    }

    /// Reverse lookup: every key linked to an external account
    pub async fn find_keys_for_account(
        &self,
        external_account_id: &str,
    ) -> Result<Vec<account_link::Model>, ApiError> {
        Ok(self.links.find_by_account(external_account_id).await?)
    }
}
