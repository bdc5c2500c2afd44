//! Whole-environment resolution
//!
//! Every `KEY=VALUE` entry whose value starts with [`REFERENCE_PREFIX`] is
//! replaced by its resolved value. Resolution is sequential and fail-fast:
//! either every reference resolves and the full environment is returned, or
//! the first failure is returned and nothing else.

use crate::{REFERENCE_PREFIX, ResolveContext, SecretError, StoreConnector, resolve_reference};
use secrecy::ExposeSecret;
use tracing::{debug, info};

/// Whether any entry mentions the reference prefix at all.
#[must_use]
pub fn contains_references(entries: &[String]) -> bool {
    entries.iter().any(|entry| entry.contains(REFERENCE_PREFIX))
}

/// Resolve all secret references in an ordered list of `KEY=VALUE` entries.
///
/// Without any reference the input is returned untouched and `connector` is
/// never used. Otherwise clients are built once, entries keep their order,
/// entries lacking `=` are dropped and non-reference values pass through.
///
/// # Errors
///
/// Returns [`SecretError::ClientInit`] if clients cannot be built, or a
/// [`SecretError::Variable`] naming the first key whose reference failed.
pub async fn resolve_environment(
    entries: Vec<String>,
    connector: &dyn StoreConnector,
    ctx: &ResolveContext,
) -> Result<Vec<String>, SecretError> {
    if !contains_references(&entries) {
        return Ok(entries);
    }

    let clients = connector.connect().await?;

    let mut resolved = Vec::with_capacity(entries.len());
    let mut count = 0_usize;
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            debug!("Dropping environment entry without '='");
            continue;
        };

        if value.starts_with(REFERENCE_PREFIX) {
            let secret = resolve_reference(value, &clients, ctx)
                .await
                .map_err(|source| SecretError::Variable {
                    key: key.to_string(),
                    source: Box::new(source),
                })?;
            resolved.push(format!("{key}={}", secret.expose_secret()));
            count += 1;
        } else {
            resolved.push(entry);
        }
    }

    info!(count, "Resolved secret references");
    Ok(resolved)
}
