//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes, currently
//! only starting the API server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email, foods, images};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches);
    let image_opts = images::Options::parse(matches)?;
    let food_opts = foods::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        frontend_base_url: auth_opts.frontend_base_url,
        verification_token_ttl_seconds: auth_opts.verification_token_ttl_seconds,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        email_from: email_opts.from,
        resend_api_key: email_opts.api_key,
        resend_api_url: email_opts.api_url,
        cloudinary_cloud_name: image_opts.cloud_name,
        cloudinary_api_key: image_opts.api_key,
        cloudinary_api_secret: image_opts.api_secret,
        cloudinary_api_url: image_opts.api_url,
        max_upload_bytes: image_opts.max_upload_bytes,
        food_api_key: food_opts.api_key,
        food_api_url: food_opts.api_url,
    }))
}
