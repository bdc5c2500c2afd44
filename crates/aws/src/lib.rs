//! AWS integration for aws-init
//!
//! This crate provides the AWS-backed fetch capabilities used by
//! `aws-init-secrets`:
//! - Secrets Manager and SSM Parameter Store via the [`secrets`] module
//! - Credential verification through STS via the [`health`] module

pub mod health;
pub mod secrets;

// Re-export main types for convenience
pub use health::{CallerIdentity, HEALTH_CHECK_TIMEOUT, HealthError, health_check};
pub use secrets::{AwsConnector, ParameterStoreFetcher, SecretsManagerFetcher};
