pub mod app;
pub mod authz;
pub mod config;
pub mod directory;
pub mod errors;
pub mod models;
pub mod policy;
pub mod routes;
pub mod storage;

// Re-export commonly used items for tests
pub use app::create_app;
