use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_CLOUD_NAME: &str = "cloudinary-cloud-name";
pub const ARG_API_KEY: &str = "cloudinary-api-key";
pub const ARG_API_SECRET: &str = "cloudinary-api-secret";
pub const ARG_API_URL: &str = "cloudinary-api-url";
pub const ARG_MAX_UPLOAD_BYTES: &str = "max-upload-bytes";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CLOUD_NAME)
                .long(ARG_CLOUD_NAME)
                .help("Cloudinary cloud name")
                .env("MEALIVO_CLOUDINARY_CLOUD_NAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Cloudinary API key")
                .env("MEALIVO_CLOUDINARY_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_SECRET)
                .long(ARG_API_SECRET)
                .help("Cloudinary API secret")
                .env("MEALIVO_CLOUDINARY_API_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Cloudinary API base URL")
                .env("MEALIVO_CLOUDINARY_API_URL")
                .default_value("https://api.cloudinary.com"),
        )
        .arg(
            Arg::new(ARG_MAX_UPLOAD_BYTES)
                .long(ARG_MAX_UPLOAD_BYTES)
                .help("Maximum accepted image size in bytes")
                .env("MEALIVO_MAX_UPLOAD_BYTES")
                .default_value("5242880")
                .value_parser(clap::value_parser!(usize)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub api_url: String,
    pub max_upload_bytes: usize,
}

impl Options {
    /// Extract image host options from the parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required Cloudinary argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            cloud_name: matches
                .get_one::<String>(ARG_CLOUD_NAME)
                .cloned()
                .context("missing required argument: --cloudinary-cloud-name")?,
            api_key: matches
                .get_one::<String>(ARG_API_KEY)
                .cloned()
                .context("missing required argument: --cloudinary-api-key")?,
            api_secret: matches
                .get_one::<String>(ARG_API_SECRET)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --cloudinary-api-secret")?,
            api_url: matches
                .get_one::<String>(ARG_API_URL)
                .cloned()
                .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
            max_upload_bytes: matches
                .get_one::<usize>(ARG_MAX_UPLOAD_BYTES)
                .copied()
                .unwrap_or(5 * 1024 * 1024),
        })
    }
}
