use crate::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use tracing::{debug, error, info_span, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Ok,
    Error,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: DatabaseStatus,
}

impl Health {
    fn current(database: DatabaseStatus) -> Self {
        Self {
            commit: GIT_COMMIT_HASH.to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
        }
    }

    /// `name:version:shorthash`, with an empty hash outside a git checkout.
    fn app_header(&self) -> String {
        let short_hash = self.commit.get(..7).filter(|_| self.commit.len() > 7);
        format!(
            "{}:{}:{}",
            self.name,
            self.version,
            short_hash.unwrap_or_default()
        )
    }
}

async fn ping_database(pool: &PgPool) -> DatabaseStatus {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let mut conn = match pool.acquire().instrument(acquire_span).await {
        Ok(conn) => conn,
        Err(err) => {
            error!("Failed to acquire database connection: {err}");
            return DatabaseStatus::Error;
        }
    };

    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    match conn.ping().instrument(ping_span).await {
        Ok(()) => DatabaseStatus::Ok,
        Err(err) => {
            error!("Failed to ping database: {err}");
            DatabaseStatus::Error
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database is reachable", body = Health),
        (status = 503, description = "Database is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(method: Method, pool: Extension<PgPool>) -> Response {
    let health = Health::current(ping_database(&pool).await);

    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&health.app_header()) {
        Ok(value) => {
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to build X-App header: {err}"),
    }

    let status = match health.database {
        DatabaseStatus::Ok => StatusCode::OK,
        DatabaseStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    debug!(database = ?health.database, "health check");

    // OPTIONS probes only need the status and headers.
    if method == Method::GET {
        (status, headers, Json(health)).into_response()
    } else {
        (status, headers, Body::empty()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mealivo::handlers::tests::{json_body, lazy_pool};

    #[tokio::test]
    async fn health_reports_unavailable_database() {
        let response = health(Method::GET, Extension(lazy_pool())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let app_header = response
            .headers()
            .get("X-App")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(app_header.starts_with(concat!(
            env!("CARGO_PKG_NAME"),
            ":",
            env!("CARGO_PKG_VERSION"),
            ":"
        )));

        let body = json_body(response).await;
        assert_eq!(body["database"], "error");
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(body["commit"], GIT_COMMIT_HASH);
    }

    #[tokio::test]
    async fn health_options_has_empty_body() {
        let response = health(Method::OPTIONS, Extension(lazy_pool())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert!(body.is_null());
    }

    #[test]
    fn app_header_uses_short_hash() {
        let mut health = Health::current(DatabaseStatus::Ok);
        health.commit = "0123456789abcdef".to_string();
        assert!(health.app_header().ends_with(":0123456"));

        health.commit = "unknown".to_string();
        assert!(health.app_header().ends_with(':'));
    }
}
