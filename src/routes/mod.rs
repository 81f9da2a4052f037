pub mod authorize;
pub mod health;
