use super::handlers::{auth, dashboard, foods, health, images, meals, user};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::sign_up::sign_up))
        .routes(routes!(auth::verification::verify_email))
        .routes(routes!(auth::verification::resend_verification))
        .routes(routes!(auth::sign_in::sign_in))
        .routes(routes!(auth::sign_in::sign_out))
        .routes(routes!(user::user))
        .routes(routes!(meals::log_meal))
        .routes(routes!(meals::delete_meal))
        .routes(routes!(meals::list_meals))
        .routes(routes!(dashboard::dashboard))
        .routes(routes!(foods::search_meal))
        .routes(routes!(foods::food_nutrients))
        .routes(routes!(images::upload_image));

    router.get_openapi_mut().tags = Some(vec![
        tag("health", "Service and database status"),
        tag("auth", "Sign-up, email verification and sessions"),
        tag("user", "Signed-in user profile"),
        tag("meals", "Logged meals"),
        tag("dashboard", "Nutrition statistics"),
        tag("foods", "Food database search"),
        tag("images", "Profile and cover pictures"),
    ]);

    router
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    // First listed author becomes the API contact.
    info.contact = env!("CARGO_PKG_AUTHORS")
        .split(':')
        .next()
        .map(parse_author)
        .and_then(|(name, email)| {
            if name.is_none() && email.is_none() {
                return None;
            }
            let mut contact = Contact::new();
            contact.name = name.map(str::to_string);
            contact.email = email.map(str::to_string);
            Some(contact)
        });

    info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|spdx| {
        let mut license = License::new(spdx);
        license.identifier = Some(spdx.to_string());
        license
    });

    OpenApiBuilder::new().info(info).build()
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// Split `Name <email>` into its parts.
fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, rest)) => (
            non_empty(name),
            non_empty(rest.trim_end().trim_end_matches('>')),
        ),
        None => (non_empty(author), None),
    }
}
