use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_FOOD_API_KEY: &str = "food-api-key";
pub const ARG_FOOD_API_URL: &str = "food-api-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FOOD_API_KEY)
                .long(ARG_FOOD_API_KEY)
                .help("Food database (Spoonacular) API key")
                .env("MEALIVO_FOOD_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_FOOD_API_URL)
                .long(ARG_FOOD_API_URL)
                .help("Food database API base URL")
                .env("MEALIVO_FOOD_API_URL")
                .default_value("https://api.spoonacular.com"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub api_key: SecretString,
    pub api_url: String,
}

impl Options {
    /// Extract food database options from the parsed matches.
    ///
    /// # Errors
    /// Returns an error if the API key is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            api_key: matches
                .get_one::<String>(ARG_FOOD_API_KEY)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --food-api-key")?,
            api_url: matches
                .get_one::<String>(ARG_FOOD_API_URL)
                .cloned()
                .unwrap_or_else(|| "https://api.spoonacular.com".to_string()),
        })
    }
}
