use crate::{
    cli::globals::GlobalArgs,
    mealivo::{
        self,
        email::{EmailSender, LogEmailSender, ResendEmailSender},
        foods::{FoodDatabase, SpoonacularClient},
        handlers::auth::{AuthConfig, AuthState},
        images::{CloudinaryClient, CloudinaryConfig, ImageHost},
    },
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub frontend_base_url: String,
    pub verification_token_ttl_seconds: i64,
    pub access_token_ttl_seconds: i64,
    pub email_from: String,
    pub resend_api_key: Option<SecretString>,
    pub resend_api_url: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: SecretString,
    pub cloudinary_api_url: String,
    pub max_upload_bytes: usize,
    pub food_api_key: SecretString,
    pub food_api_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if an outbound client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut globals = GlobalArgs::new(args.jwt_secret);
    globals.set_resend_api_key(args.resend_api_key);
    globals.set_cloudinary_credentials(args.cloudinary_api_key, args.cloudinary_api_secret);
    globals.set_food_api_key(args.food_api_key);

    debug!("Global args: {:?}", globals);

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_verification_token_ttl_seconds(args.verification_token_ttl_seconds)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds);
    let auth_state = Arc::new(AuthState::new(auth_config, &globals.jwt_secret));

    let email: Arc<dyn EmailSender> = match &globals.resend_api_key {
        Some(api_key) => Arc::new(ResendEmailSender::new(
            args.resend_api_url,
            api_key.clone(),
            args.email_from,
        )?),
        None => {
            warn!("No Resend API key configured, verification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let images: Arc<dyn ImageHost> = Arc::new(CloudinaryClient::new(CloudinaryConfig {
        api_url: args.cloudinary_api_url,
        cloud_name: args.cloudinary_cloud_name,
        api_key: globals.cloudinary_api_key.clone(),
        api_secret: globals.cloudinary_api_secret.clone(),
    })?);

    let foods: Arc<dyn FoodDatabase> = Arc::new(SpoonacularClient::new(
        args.food_api_url,
        globals.food_api_key.clone(),
    )?);

    mealivo::new(
        args.port,
        &args.dsn,
        mealivo::Dependencies {
            auth: auth_state,
            email,
            images,
            foods,
            max_upload_bytes: args.max_upload_bytes,
        },
    )
    .await
}
