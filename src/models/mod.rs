pub mod grant;

pub use grant::{AuthorizationGrant, AuthorizationRequest, AuthorizationResponse};
