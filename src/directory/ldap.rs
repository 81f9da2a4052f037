use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, Scope, SearchEntry};

use super::{DirectoryService, Identity};
use crate::errors::AppError;

/// The directory attribute holding the canonical account id.
const ACCOUNT_ATTRIBUTE: &str = "sAMAccountName";

/// LDAP result code for a rejected credential.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// `DirectoryService` backed by an Active Directory LDAP endpoint.
///
/// Each operation opens its own connection and binds with the presented
/// credential; nothing is cached between invocations.
pub struct LdapDirectory {
    url: String,
    base_dn: String,
}

impl LdapDirectory {
    pub fn new(url: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            base_dn: base_dn.into(),
        }
    }

    async fn connect(&self) -> Result<Ldap, AppError> {
        let (conn, ldap) = LdapConnAsync::new(&self.url)
            .await
            .map_err(|err| AppError::directory_unavailable(format!("ldap connect: {err}")))?;
        ldap3::drive!(conn);
        Ok(ldap)
    }

    /// Simple bind with the caller's credential. `Ok(false)` only for
    /// `invalidCredentials`; any other non-zero result code is a directory
    /// fault, not a verdict on the credential.
    async fn try_bind(
        &self,
        ldap: &mut Ldap,
        login_name: &str,
        secret: &str,
    ) -> Result<bool, AppError> {
        let result = ldap
            .simple_bind(login_name, secret)
            .await
            .map_err(|err| AppError::directory_unavailable(format!("ldap bind: {err}")))?;

        match result.rc {
            0 => Ok(true),
            RC_INVALID_CREDENTIALS => Ok(false),
            rc => Err(AppError::directory_unavailable(format!(
                "ldap bind rejected: rc={rc} {}",
                result.text
            ))),
        }
    }
}

#[async_trait]
impl DirectoryService for LdapDirectory {
    async fn bind(&self, login_name: &str, secret: &str) -> Result<bool, AppError> {
        let mut ldap = self.connect().await?;
        let authenticated = self.try_bind(&mut ldap, login_name, secret).await?;
        let _ = ldap.unbind().await;
        Ok(authenticated)
    }

    async fn find_canonical_id(
        &self,
        login_name: &str,
        secret: &str,
    ) -> Result<Identity, AppError> {
        let mut ldap = self.connect().await?;
        if !self.try_bind(&mut ldap, login_name, secret).await? {
            // resolution is only ever attempted after a successful
            // authentication, so a rejected re-bind is a directory anomaly
            return Err(AppError::authentication_failed(format!(
                "re-bind for lookup rejected for {login_name}"
            )));
        }

        let escaped = ldap3::ldap_escape(login_name);
        let filter = format!(
            "(|({ACCOUNT_ATTRIBUTE}={escaped})(userPrincipalName={escaped}))"
        );
        let (entries, _result) = ldap
            .search(
                &self.base_dn,
                Scope::Subtree,
                &filter,
                vec![ACCOUNT_ATTRIBUTE],
            )
            .await
            .map_err(|err| AppError::directory_unavailable(format!("ldap search: {err}")))?
            .success()
            .map_err(|err| AppError::directory_unavailable(format!("ldap search: {err}")))?;
        let _ = ldap.unbind().await;

        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::identity_not_found(format!("no directory record for {login_name}"))
            })?;
        let entry = SearchEntry::construct(entry);
        let account_id = entry
            .attrs
            .get(ACCOUNT_ATTRIBUTE)
            .and_then(|values| values.first())
            .cloned()
            .ok_or_else(|| {
                AppError::identity_not_found(format!(
                    "record for {login_name} has no {ACCOUNT_ATTRIBUTE}"
                ))
            })?;

        Ok(Identity {
            canonical_account_id: account_id,
        })
    }
}
