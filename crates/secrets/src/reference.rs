//! Parsing of `aws-secret:` reference strings

use crate::SecretError;

/// Marker identifying an environment value as a secret reference.
pub const REFERENCE_PREFIX: &str = "aws-secret:";

/// Secrets Manager secrets exposed through Parameter Store live under this path.
pub const PARAMETER_PATH_PREFIX: &str = "/aws/reference/secretsmanager/";

/// A parsed secret reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretReference {
    /// Whole secret string, returned as stored
    Secret {
        /// Secret name or ARN
        name: String,
    },
    /// One key of a secret holding a flat JSON object of strings
    SecretKey {
        /// Secret name or ARN
        name: String,
        /// Key to extract; may itself contain `#`
        key: String,
    },
    /// Full parameter path, fetched with decryption
    Parameter {
        /// Path beginning with [`PARAMETER_PATH_PREFIX`]
        path: String,
    },
}

impl SecretReference {
    /// Parse a reference string.
    ///
    /// A missing prefix is tolerated; callers only hand over values that
    /// carry it.
    ///
    /// # Errors
    ///
    /// [`SecretError::EmptyReference`] when nothing follows the prefix and
    /// [`SecretError::EmptyName`] when the part before `#` is empty.
    pub fn parse(reference: &str) -> Result<Self, SecretError> {
        let remainder = reference
            .strip_prefix(REFERENCE_PREFIX)
            .unwrap_or(reference);
        if remainder.is_empty() {
            return Err(SecretError::EmptyReference);
        }

        if remainder.starts_with(PARAMETER_PATH_PREFIX) {
            return Ok(Self::Parameter {
                path: remainder.to_string(),
            });
        }

        let (name, key) = match remainder.split_once('#') {
            Some((name, key)) => (name, Some(key)),
            None => (remainder, None),
        };
        if name.is_empty() {
            return Err(SecretError::EmptyName);
        }

        Ok(match key {
            Some(key) => Self::SecretKey {
                name: name.to_string(),
                key: key.to_string(),
            },
            None => Self::Secret {
                name: name.to_string(),
            },
        })
    }

    /// Secret name or parameter path this reference points at.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Secret { name } | Self::SecretKey { name, .. } => name,
            Self::Parameter { path } => path,
        }
    }

    /// JSON key to extract, if any.
    #[must_use]
    pub fn json_key(&self) -> Option<&str> {
        match self {
            Self::SecretKey { key, .. } => Some(key),
            Self::Secret { .. } | Self::Parameter { .. } => None,
        }
    }
}
