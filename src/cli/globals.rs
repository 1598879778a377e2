use secrecy::SecretString;

/// Secrets shared by the server and its outbound clients.
#[derive(Clone)]
pub struct GlobalArgs {
    pub jwt_secret: SecretString,
    pub resend_api_key: Option<SecretString>,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: SecretString,
    pub food_api_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            resend_api_key: None,
            cloudinary_api_key: String::new(),
            cloudinary_api_secret: SecretString::default(),
            food_api_key: SecretString::default(),
        }
    }

    pub fn set_resend_api_key(&mut self, key: Option<SecretString>) {
        self.resend_api_key = key;
    }

    pub fn set_cloudinary_credentials(&mut self, api_key: String, api_secret: SecretString) {
        self.cloudinary_api_key = api_key;
        self.cloudinary_api_secret = api_secret;
    }

    pub fn set_food_api_key(&mut self, key: SecretString) {
        self.food_api_key = key;
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("jwt_secret", &"***")
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "***"),
            )
            .field("cloudinary_api_key", &self.cloudinary_api_key)
            .field("cloudinary_api_secret", &"***")
            .field("food_api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let mut args = GlobalArgs::new(SecretString::from("jwt-secret"));
        assert_eq!(args.jwt_secret.expose_secret(), "jwt-secret");
        assert!(args.resend_api_key.is_none());
        assert_eq!(args.cloudinary_api_secret.expose_secret(), "");

        args.set_cloudinary_credentials("key".to_string(), SecretString::from("secret"));
        assert_eq!(args.cloudinary_api_key, "key");
        assert_eq!(args.cloudinary_api_secret.expose_secret(), "secret");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut args = GlobalArgs::new(SecretString::from("jwt-secret"));
        args.set_resend_api_key(Some(SecretString::from("re_123")));
        args.set_food_api_key(SecretString::from("food-key"));
        let rendered = format!("{args:?}");
        assert!(!rendered.contains("jwt-secret"));
        assert!(!rendered.contains("re_123"));
        assert!(!rendered.contains("food-key"));
    }
}
