use crate::errors::AppError;

/// Process-wide configuration, read once at startup and immutable for the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bucket name backing user home directories; also the first path
    /// component of the mount point presented to the transfer platform.
    pub home_directory_name: String,
    /// IAM role assumed by the platform on behalf of the user.
    pub s3_access_role_arn: String,
    /// Bucket ARN substituted into the scope-down policy resources.
    pub s3_root_bucket_arn: String,
    /// Directory-service endpoint, e.g. `ldaps://ad.example.com:636`.
    pub directory_url: String,
    /// Base distinguished name for identity lookups.
    pub directory_base_dn: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            home_directory_name: required_var("HOME_DIRECTORY_NAME")?,
            s3_access_role_arn: required_var("S3_ACCESS_ROLE_ARN")?,
            s3_root_bucket_arn: required_var("S3_ROOT_BUCKET_ARN")?,
            directory_url: required_var("ACTIVE_DIRECTORY_URL")?,
            directory_base_dn: required_var("ACTIVE_DIRECTORY_BASE_DN")?,
        })
    }

    /// Mount prefix for granted home directories, e.g. `/transfer-home`.
    pub fn home_directory_prefix(&self) -> String {
        format!("/{}", self.home_directory_name)
    }
}

pub(crate) fn required_var(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::configuration(format!("{name} not set")))
}
