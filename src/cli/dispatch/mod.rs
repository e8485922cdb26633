//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{admin, email, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let session_opts = session::Options::parse(matches)?;
    let admin_opts = admin::Options::parse(matches);
    let email_opts = email::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        session_secret: session_opts.session_secret,
        session_ttl_seconds: session_opts.session_ttl_seconds,
        recovery_secret: session_opts.recovery_secret,
        recovery_ttl_seconds: session_opts.recovery_ttl_seconds,
        admin_email: admin_opts.email,
        admin_password_hash: admin_opts.password_hash,
        admin_password: admin_opts.password,
        admin_list: admin_opts.list,
        admin_list_file: admin_opts.list_file,
        email_api_key: email_opts.api_key,
        email_from: email_opts.from_email,
        email_api_url: email_opts.api_url,
        frontend_base_url: email_opts.frontend_base_url,
    }))
}
