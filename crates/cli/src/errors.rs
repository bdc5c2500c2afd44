//! Top-level errors of the aws-init binary, reported with miette

use aws_init_aws::HealthError;
use aws_init_secrets::{ErrorKind, SecretError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Secret resolution failed, command not started")]
    #[diagnostic(code(aws_init::resolve))]
    Resolve {
        #[source]
        source: SecretError,
        #[help]
        help_text: Option<String>,
    },

    #[error("Health check failed")]
    #[diagnostic(
        code(aws_init::health),
        help("Check AWS_REGION and the credential chain (env, profile, IMDS, task role)")
    )]
    Health {
        #[source]
        source: HealthError,
    },

    #[error("Tracing initialization failed: {message}")]
    #[diagnostic(code(aws_init::tracing))]
    Tracing { message: String },
}

impl CliError {
    pub fn resolve(source: SecretError) -> Self {
        let help_text = match source.kind() {
            ErrorKind::ReferenceFormat => {
                Some("References look like aws-secret:name or aws-secret:name#key".to_string())
            }
            ErrorKind::ClientInit => Some("Set AWS_REGION or AWS_DEFAULT_REGION".to_string()),
            _ => None,
        };
        Self::Resolve { source, help_text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_errors_get_help() {
        let err = CliError::resolve(SecretError::Variable {
            key: "DB".to_string(),
            source: Box::new(SecretError::EmptyReference),
        });
        let CliError::Resolve { help_text, .. } = &err else {
            panic!("expected Resolve");
        };
        assert!(help_text.as_deref().unwrap().contains("aws-secret:"));
    }

    #[test]
    fn test_cancellation_has_no_help() {
        let err = CliError::resolve(SecretError::Cancelled);
        assert!(matches!(err, CliError::Resolve { help_text: None, .. }));
    }

    #[test]
    fn test_source_chain_names_variable() {
        let err = CliError::resolve(SecretError::Variable {
            key: "API_KEY".to_string(),
            source: Box::new(SecretError::EmptyName),
        });
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "failed to resolve API_KEY: empty secret name");
    }
}
