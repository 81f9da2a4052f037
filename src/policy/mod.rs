//! Scope-down policy model and synthesis.
//!
//! The template is immutable process-wide state; `synthesize` builds a new
//! document per request so concurrent invocations can never observe each
//! other's scoping tokens.

use serde::{Deserialize, Serialize};

use crate::directory::Identity;

pub const POLICY_VERSION: &str = "2012-10-17";

/// Actions granted on objects inside the user's namespace.
const OBJECT_ACTIONS: [&str; 7] = [
    "s3:PutObject",
    "s3:GetObjectAcl",
    "s3:GetObject",
    "s3:DeleteObjectVersion",
    "s3:DeleteObject",
    "s3:PutObjectAcl",
    "s3:GetObjectVersion",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid")]
    pub sid: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub action: ActionSet,
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// IAM accepts a bare string or a list for `Action`; both shapes appear in
/// the emitted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionSet {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "StringLike")]
    pub string_like: PrefixMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixMatch {
    #[serde(rename = "s3:prefix")]
    pub s3_prefix: Vec<String>,
}

/// Immutable synthesis input: the bucket ARN every statement is scoped
/// under. Built once at startup from `Settings`.
#[derive(Debug, Clone)]
pub struct PolicyTemplate {
    bucket_arn: String,
}

impl PolicyTemplate {
    pub fn new(bucket_arn: impl Into<String>) -> Self {
        Self {
            bucket_arn: bucket_arn.into(),
        }
    }

    /// Build a fresh scope-down document for a resolved identity.
    ///
    /// Scoping tokens come exclusively from `identity.canonical_account_id`.
    /// The raw login name is not an input here, so no statement can ever
    /// reference it.
    pub fn synthesize(&self, identity: &Identity) -> PolicyDocument {
        let account_id = &identity.canonical_account_id;
        PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![
                Statement {
                    sid: "AllowListingOfUserFolder".to_string(),
                    effect: Effect::Allow,
                    action: ActionSet::One("s3:ListBucket".to_string()),
                    resource: self.bucket_arn.clone(),
                    condition: Some(Condition {
                        string_like: PrefixMatch {
                            s3_prefix: vec![format!("{account_id}/*"), account_id.clone()],
                        },
                    }),
                },
                Statement {
                    sid: "AllowUserObjectAccess".to_string(),
                    effect: Effect::Allow,
                    action: ActionSet::Many(
                        OBJECT_ACTIONS.iter().map(|action| action.to_string()).collect(),
                    ),
                    resource: format!("{}/{account_id}*", self.bucket_arn),
                    condition: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity {
            canonical_account_id: id.to_string(),
        }
    }

    #[test]
    fn list_statement_is_scoped_to_account_prefix() {
        let template = PolicyTemplate::new("arn:aws:s3:::transfer-home");
        let doc = template.synthesize(&identity("A1234"));

        let list = &doc.statement[0];
        assert_eq!(list.resource, "arn:aws:s3:::transfer-home");
        let prefixes = &list.condition.as_ref().unwrap().string_like.s3_prefix;
        assert_eq!(prefixes, &vec!["A1234/*".to_string(), "A1234".to_string()]);
    }

    #[test]
    fn object_statement_is_scoped_to_account_resource() {
        let template = PolicyTemplate::new("arn:aws:s3:::transfer-home");
        let doc = template.synthesize(&identity("A1234"));

        let objects = &doc.statement[1];
        assert_eq!(objects.resource, "arn:aws:s3:::transfer-home/A1234*");
        assert!(objects.condition.is_none());
        match &objects.action {
            ActionSet::Many(actions) => {
                assert!(actions.contains(&"s3:GetObject".to_string()));
                assert!(actions.contains(&"s3:DeleteObjectVersion".to_string()));
            }
            ActionSet::One(_) => panic!("object statement carries an action list"),
        }
    }

    #[test]
    fn serialized_shape_matches_platform_contract() {
        let template = PolicyTemplate::new("arn:aws:s3:::transfer-home");
        let doc = template.synthesize(&identity("A1234"));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["Version"], "2012-10-17");
        assert_eq!(value["Statement"][0]["Effect"], "Allow");
        assert_eq!(value["Statement"][0]["Action"], "s3:ListBucket");
        assert_eq!(
            value["Statement"][0]["Condition"]["StringLike"]["s3:prefix"][0],
            "A1234/*"
        );
        assert_eq!(
            value["Statement"][1]["Resource"],
            "arn:aws:s3:::transfer-home/A1234*"
        );
        // no Condition key at all on the object statement
        assert!(value["Statement"][1].get("Condition").is_none());
    }

    #[test]
    fn synthesis_returns_a_fresh_document_per_call() {
        let template = PolicyTemplate::new("arn:aws:s3:::transfer-home");
        let first = template.synthesize(&identity("A1234"));
        let second = template.synthesize(&identity("B5678"));

        // the first document is unaffected by the second synthesis
        assert_eq!(
            first.statement[0].condition.as_ref().unwrap().string_like.s3_prefix[1],
            "A1234"
        );
        assert_eq!(
            second.statement[0].condition.as_ref().unwrap().string_like.s3_prefix[1],
            "B5678"
        );
    }
}
