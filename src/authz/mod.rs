//! Authorization decision flow: orchestration and namespace provisioning.

mod orchestrator;
pub mod provisioner;

pub use orchestrator::Authorizer;
