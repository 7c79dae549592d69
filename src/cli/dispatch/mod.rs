//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    ARG_ACCESS_POLICY, ARG_DSN, ARG_MAX_CONNECTIONS, ARG_PORT, ARG_SEED,
};
use crate::{api::MEMORY_DSN_SCHEME, repairs::AccessPolicy};
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing, the DSN is invalid, or
/// a seed file is given for a database DSN.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    let url = crate::cli::actions::server::validate_dsn(&dsn)?;

    let seed = matches.get_one::<PathBuf>(ARG_SEED).cloned();
    if seed.is_some() && url.scheme() != MEMORY_DSN_SCHEME {
        bail!("--seed requires a {MEMORY_DSN_SCHEME}:// DSN");
    }

    let max_connections = matches
        .get_one::<u32>(ARG_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);
    let access_policy = matches
        .get_one::<AccessPolicy>(ARG_ACCESS_POLICY)
        .copied()
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        max_connections,
        access_policy,
        seed,
    }))
}
