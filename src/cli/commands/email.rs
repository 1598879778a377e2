use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_EMAIL_FROM: &str = "email-from";
pub const ARG_RESEND_API_KEY: &str = "resend-api-key";
pub const ARG_RESEND_API_URL: &str = "resend-api-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("Sender address for outbound email")
                .env("MEALIVO_EMAIL_FROM")
                .default_value("Mealivo <onboarding@resend.dev>"),
        )
        .arg(
            Arg::new(ARG_RESEND_API_KEY)
                .long(ARG_RESEND_API_KEY)
                .help("Resend API key; when unset, emails are written to the log instead")
                .env("MEALIVO_RESEND_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_RESEND_API_URL)
                .long(ARG_RESEND_API_URL)
                .help("Resend API base URL")
                .env("MEALIVO_RESEND_API_URL")
                .default_value("https://api.resend.com"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub from: String,
    pub api_key: Option<SecretString>,
    pub api_url: String,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            from: matches
                .get_one::<String>(ARG_EMAIL_FROM)
                .cloned()
                .unwrap_or_else(|| "Mealivo <onboarding@resend.dev>".to_string()),
            api_key: matches
                .get_one::<String>(ARG_RESEND_API_KEY)
                .filter(|key| !key.trim().is_empty())
                .cloned()
                .map(SecretString::from),
            api_url: matches
                .get_one::<String>(ARG_RESEND_API_URL)
                .cloned()
                .unwrap_or_else(|| "https://api.resend.com".to_string()),
        }
    }
}
