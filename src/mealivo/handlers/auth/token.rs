//! Signed tokens for email verification and sessions.
//!
//! Both kinds are HS256 JWTs signed with the same secret. A `purpose` claim keeps
//! them apart, so an access token can never verify an email and a verification
//! link can never open a session.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    VerifyEmail,
    Access,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub email: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

trait Purposed {
    fn purpose(&self) -> TokenPurpose;
}

impl Purposed for VerificationClaims {
    fn purpose(&self) -> TokenPurpose {
        self.purpose
    }
}

impl Purposed for AccessClaims {
    fn purpose(&self) -> TokenPurpose {
        self.purpose
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token issued for another purpose")]
    WrongPurpose,
    #[error("failed to sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// # Errors
    /// Returns [`TokenError::Sign`] if the claims cannot be encoded.
    pub fn issue_verification(&self, email: &str, ttl_seconds: i64) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        self.sign(&VerificationClaims {
            email: email.to_string(),
            purpose: TokenPurpose::VerifyEmail,
            iat,
            exp: iat.saturating_add(ttl_seconds),
        })
    }

    /// # Errors
    /// Returns [`TokenError::Sign`] if the claims cannot be encoded.
    pub fn issue_access(&self, user_id: Uuid, ttl_seconds: i64) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        self.sign(&AccessClaims {
            user_id,
            purpose: TokenPurpose::Access,
            iat,
            exp: iat.saturating_add(ttl_seconds),
        })
    }

    /// # Errors
    /// Returns an error when the token is expired, tampered with or not a verification token.
    pub fn verify_verification(&self, token: &str) -> Result<VerificationClaims, TokenError> {
        self.verify(token, TokenPurpose::VerifyEmail)
    }

    /// # Errors
    /// Returns an error when the token is expired, tampered with or not an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, TokenPurpose::Access)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Sign)
    }

    fn verify<T>(&self, token: &str, purpose: TokenPurpose) -> Result<T, TokenError>
    where
        T: DeserializeOwned + Purposed,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<T>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.purpose() == purpose {
            Ok(data.claims)
        } else {
            Err(TokenError::WrongPurpose)
        }
    }
}
