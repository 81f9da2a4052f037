//! Directory-service capability.
//!
//! The orchestrator depends only on this two-operation interface, not on a
//! specific directory-library session type.

mod ldap;

pub use ldap::LdapDirectory;

use async_trait::async_trait;

use crate::errors::AppError;

/// A directory-verified identity. All downstream scoping must use
/// `canonical_account_id`, never the login name the caller presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub canonical_account_id: String,
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Verify a credential. `Ok(false)` means the directory rejected the
    /// credential; `Err` means the bind could not be attempted or
    /// completed. A single round trip, no retries.
    async fn bind(&self, login_name: &str, secret: &str) -> Result<bool, AppError>;

    /// Resolve the canonical account identifier for a login name. Performs
    /// its own authenticated bind with the same credential; it does not
    /// reuse any session from a prior `bind` call.
    async fn find_canonical_id(
        &self,
        login_name: &str,
        secret: &str,
    ) -> Result<Identity, AppError>;
}
