use std::sync::Arc;

use crate::config::Settings;
use crate::directory::DirectoryService;
use crate::errors::AppError;
use crate::models::{AuthorizationGrant, AuthorizationRequest, AuthorizationResponse};
use crate::policy::PolicyTemplate;
use crate::storage::StorageService;

use super::provisioner;

/// Sequences one authorization decision: authenticate the credential,
/// resolve the canonical identity, ensure the storage namespace, synthesize
/// the scoped policy. Each stage gates the next; any failure anywhere
/// collapses to the single denial shape at this boundary.
pub struct Authorizer {
    directory: Arc<dyn DirectoryService>,
    storage: Arc<dyn StorageService>,
    template: PolicyTemplate,
    role_arn: String,
    home_directory_prefix: String,
    bucket: String,
}

impl Authorizer {
    pub fn new(
        settings: &Settings,
        directory: Arc<dyn DirectoryService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            directory,
            storage,
            template: PolicyTemplate::new(settings.s3_root_bucket_arn.clone()),
            role_arn: settings.s3_access_role_arn.clone(),
            home_directory_prefix: settings.home_directory_prefix(),
            bucket: settings.home_directory_name.clone(),
        }
    }

    /// Decide one login attempt. Callers receive either a complete grant or
    /// the empty denial value; the denial reason goes to operator logs only,
    /// so an unauthenticated caller cannot probe for account existence.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizationResponse {
        match self.try_authorize(request).await {
            Ok(grant) => {
                tracing::info!(user_name = %grant.user_name, "authorization granted");
                AuthorizationResponse::Granted(grant)
            }
            Err(err) => {
                tracing::warn!(
                    login_name = %request.username,
                    kind = err.kind(),
                    error = %err,
                    "authorization denied"
                );
                AuthorizationResponse::denied()
            }
        }
    }

    async fn try_authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationGrant, AppError> {
        let authenticated = self
            .directory
            .bind(&request.username, &request.password)
            .await?;
        if !authenticated {
            return Err(AppError::authentication_failed(format!(
                "directory rejected credential for {}",
                request.username
            )));
        }
        tracing::debug!(login_name = %request.username, "credential authenticated");

        // fresh bind inside the resolver; resolution never reuses the
        // authentication session
        let identity = self
            .directory
            .find_canonical_id(&request.username, &request.password)
            .await?;
        tracing::debug!(
            login_name = %request.username,
            account_id = %identity.canonical_account_id,
            "canonical identity resolved"
        );

        // no grant unless the namespace is confirmed or created
        provisioner::ensure_namespace(
            self.storage.as_ref(),
            &self.bucket,
            &identity.canonical_account_id,
        )
        .await?;

        let policy = self.template.synthesize(&identity);
        Ok(AuthorizationGrant {
            role: self.role_arn.clone(),
            policy: serde_json::to_string(&policy)?,
            home_directory: format!(
                "{}/{}",
                self.home_directory_prefix, identity.canonical_account_id
            ),
            user_name: identity.canonical_account_id,
        })
    }
}
