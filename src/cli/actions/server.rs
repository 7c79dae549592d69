use crate::{
    api::{self, MEMORY_DSN_SCHEME},
    cli::telemetry,
    repairs::{
        memory::Seed,
        token::{token_fingerprint, valid_token},
        AccessPolicy,
    },
};
use anyhow::{anyhow, bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub max_connections: u32,
    pub access_policy: AccessPolicy,
    pub seed: Option<PathBuf>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN or seed file is invalid, the store is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = validate_dsn(args.dsn.expose_secret())?;
    let seed = args.seed.as_deref().map(read_seed).transpose()?;

    debug!(
        dsn = %redact(&dsn),
        max_connections = args.max_connections,
        access_policy = %args.access_policy,
        seed = ?args.seed,
        "Starting server"
    );

    let result = api::new(
        args.port,
        args.dsn.expose_secret(),
        args.max_connections,
        args.access_policy,
        seed,
    )
    .await;

    telemetry::shutdown_tracer();

    result
}

/// Parse the DSN and reject schemes the server cannot open.
pub(crate) fn validate_dsn(dsn: &str) -> Result<Url> {
    let url = Url::parse(dsn).context("Invalid DSN")?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(url),
        scheme if scheme == MEMORY_DSN_SCHEME => Ok(url),
        scheme => Err(anyhow!(
            "Unsupported DSN scheme '{scheme}', expected postgres:// or {MEMORY_DSN_SCHEME}://"
        )),
    }
}

/// Read and check a seed file for the in-memory store.
pub(crate) fn read_seed(path: &Path) -> Result<Seed> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed(&raw).with_context(|| format!("Invalid seed file {}", path.display()))
}

fn parse_seed(raw: &str) -> Result<Seed> {
    let seed: Seed = serde_json::from_str(raw)?;
    if let Some(token) = seed.tokens().find(|token| !valid_token(token)) {
        bail!(
            "token {} is not 16-128 URL-safe characters",
            token_fingerprint(token)
        );
    }
    Ok(seed)
}

// Strip credentials before the DSN reaches the logs
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("****"));
    }
    redacted.to_string()
}
