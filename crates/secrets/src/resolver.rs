//! Single-reference resolution with retry and JSON key extraction

use crate::{FetchError, ResolveContext, SecretError, SecretReference, StoreClients};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempts made against the store before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base retry delay; attempt `n` waits `RETRY_DELAY * (n - 1)` first.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Resolve one `aws-secret:` reference to its value.
///
/// # Errors
///
/// Returns a reference-format error for malformed input, [`SecretError::NotJson`]
/// or [`SecretError::KeyNotFound`] when key extraction fails,
/// [`SecretError::Store`] once retries are exhausted, and a cancellation error
/// as soon as `ctx` stops.
pub async fn resolve_reference(
    reference: &str,
    clients: &StoreClients,
    ctx: &ResolveContext,
) -> Result<SecretString, SecretError> {
    let reference = SecretReference::parse(reference)?;
    let target = reference.target();
    debug!(secret = %target, key = ?reference.json_key(), "Resolving reference");

    let raw = SecretString::from(match &reference {
        SecretReference::Parameter { .. } => {
            fetch_with_retry(target, ctx, || clients.parameters.fetch_parameter(target)).await?
        }
        SecretReference::Secret { .. } | SecretReference::SecretKey { .. } => {
            fetch_with_retry(target, ctx, || clients.secrets.fetch_secret(target)).await?
        }
    });

    match reference.json_key() {
        Some(key) => extract_key(target, &raw, key),
        None => Ok(raw),
    }
}

/// Pull `key` out of a secret holding a flat JSON object of strings.
fn extract_key(name: &str, raw: &SecretString, key: &str) -> Result<SecretString, SecretError> {
    let mut parsed: HashMap<String, String> = serde_json::from_str(raw.expose_secret())
        .map_err(|source| SecretError::NotJson {
            secret: name.to_string(),
            source,
        })?;

    parsed
        .remove(key)
        .map(SecretString::from)
        .ok_or_else(|| SecretError::KeyNotFound {
            key: key.to_string(),
            secret: name.to_string(),
        })
}

/// Run `fetch` up to [`MAX_ATTEMPTS`] times, backing off linearly between
/// attempts. An empty response counts as a failed attempt.
async fn fetch_with_retry<F, Fut>(
    target: &str,
    ctx: &ResolveContext,
    fetch: F,
) -> Result<String, SecretError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<String>, FetchError>>,
{
    let mut attempt = 1;
    loop {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let outcome = tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            outcome = fetch() => outcome,
        };

        let err = match outcome {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => FetchError::MissingValue {
                target: target.to_string(),
            },
            Err(err) => err,
        };

        if attempt >= MAX_ATTEMPTS {
            return Err(SecretError::Store {
                target: target.to_string(),
                attempts: attempt,
                source: err,
            });
        }

        warn!(
            secret = %target,
            attempt,
            error = %err,
            "Fetch failed, retrying"
        );

        tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            () = tokio::time::sleep(RETRY_DELAY * attempt) => {}
        }
        attempt += 1;
    }
}
