//! # Mealivo (meal tracking API)
//!
//! `mealivo` is the server side of a meal-tracking application. Users sign up,
//! confirm their email address through a signed link, log meals with nutrient
//! data, search an external food database, upload profile and cover pictures,
//! and read dashboard statistics computed from their logged meals.
//!
//! ## Accounts
//!
//! - **Sign-up** stores an Argon2id password hash and emails a verification link.
//! - **Verification tokens** are HS256 JWTs carrying the email and a purpose claim;
//!   they expire after 30 minutes by default.
//! - **Access tokens** are HS256 JWTs carrying the user id. They travel in the
//!   `accessToken` cookie (or a bearer header) and are never accepted as
//!   verification tokens.
//!
//! ## Meals
//!
//! Nutrient values are stored exactly as entered (`"12g"`, `"250"`) and parsed
//! only when aggregated, the same way `parseFloat` would read them.
//!
//! ## External services
//!
//! Email delivery, image hosting and the food database are reached over HTTP
//! through the `EmailSender`, `ImageHost` and `FoodDatabase` traits so handlers can
//! be exercised against local doubles.

pub mod cli;
pub mod mealivo;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
