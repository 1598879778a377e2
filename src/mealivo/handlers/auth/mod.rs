//! Auth handlers and supporting modules.
//!
//! Accounts are created with a password (Argon2id) and stay unverified until
//! the emailed link is opened. Verified users sign in and receive an access
//! token in the `accessToken` cookie; every other `/api` endpoint resolves the
//! caller through [`session::authenticate`].

mod password;
pub(crate) mod session;
pub(crate) mod sign_in;
pub(crate) mod sign_up;
mod state;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
pub use token::TokenError;
