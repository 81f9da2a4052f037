use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One login attempt. The credential is transient: it lives only for the
/// duration of the request and is never persisted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthorizationRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

/// Successful authorization output. Field names are the wire contract
/// expected by the invoking transfer platform.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorizationGrant {
    #[serde(rename = "Role")]
    #[schema(example = "arn:aws:iam::111122223333:role/transfer-access")]
    pub role: String,
    /// Serialized scope-down policy document.
    #[serde(rename = "Policy")]
    pub policy: String,
    #[serde(rename = "HomeDirectory")]
    #[schema(example = "/transfer-home/A1234")]
    pub home_directory: String,
    /// Canonical account id resolved from the directory, which may differ
    /// from the login name the caller presented.
    #[serde(rename = "userName")]
    #[schema(example = "A1234")]
    pub user_name: String,
}

/// Either a complete grant or the empty object. Denials carry no fields at
/// all: the caller must see either everything or nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuthorizationResponse {
    Granted(AuthorizationGrant),
    Denied {},
}

impl AuthorizationResponse {
    pub fn denied() -> Self {
        Self::Denied {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_serializes_as_empty_object() {
        let value = serde_json::to_value(AuthorizationResponse::denied()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn grant_uses_platform_field_names() {
        let grant = AuthorizationGrant {
            role: "arn:aws:iam::1:role/r".into(),
            policy: "{}".into(),
            home_directory: "/transfer-home/A1234".into(),
            user_name: "A1234".into(),
        };
        let value = serde_json::to_value(AuthorizationResponse::Granted(grant)).unwrap();
        assert_eq!(value["Role"], "arn:aws:iam::1:role/r");
        assert_eq!(value["Policy"], "{}");
        assert_eq!(value["HomeDirectory"], "/transfer-home/A1234");
        assert_eq!(value["userName"], "A1234");
    }
}
