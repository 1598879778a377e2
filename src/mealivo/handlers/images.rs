//! Profile picture and cover background uploads.

use axum::{
    extract::{Extension, Multipart},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::{
    auth::{session::authenticate, AuthState},
    message, Message,
};
use crate::mealivo::{
    images::{ImageFile, ImageHost, ImageSlot, UploadResult},
    storage::users,
};

/// Largest accepted file, in bytes.
#[derive(Clone, Copy, Debug)]
pub struct UploadLimit(pub usize);

#[derive(ToSchema, Serialize, Debug)]
pub struct UploadResponse {
    pub result: UploadResult,
}

/// Multipart form accepted by the upload endpoint.
#[derive(ToSchema, Deserialize)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// `profile` or `cover`.
    #[serde(rename = "type")]
    pub slot: String,
}

async fn read_upload(
    mut multipart: Multipart,
    limit: UploadLimit,
) -> Result<(ImageSlot, ImageFile), Response> {
    let mut file: Option<ImageFile> = None;
    let mut slot: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Failed to read multipart body: {err}");
                return Err(message(err.status(), err.body_text()));
            }
        };

        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!("Failed to read uploaded file: {err}");
                        return Err(message(err.status(), err.body_text()));
                    }
                };
                file = Some(ImageFile {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
            }
            Some("type") => {
                slot = field.text().await.ok();
            }
            _ => {}
        }
    }

    let Some(file) = file.filter(|file| !file.bytes.is_empty()) else {
        return Err(message(StatusCode::BAD_REQUEST, "File not found"));
    };

    let slot = match ImageSlot::parse(slot.as_deref().unwrap_or_default()) {
        Ok(slot) => slot,
        Err(err) => return Err(message(StatusCode::BAD_REQUEST, err.to_string())),
    };

    if !file.content_type.starts_with("image/") {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "Only image files are allowed",
        ));
    }

    if file.bytes.len() > limit.0 {
        return Err(message(StatusCode::PAYLOAD_TOO_LARGE, "File is too large"));
    }

    Ok((slot, file))
}

/// Swap the image held in a slot at the host.
///
/// The previous image is deleted first; a failed delete is logged and the
/// upload still goes ahead.
pub(crate) async fn replace_image(
    images: &dyn ImageHost,
    previous_public_id: Option<&str>,
    slot: ImageSlot,
    file: ImageFile,
) -> Result<UploadResult, Response> {
    if let Some(old_id) = previous_public_id {
        if let Err(err) = images.destroy(old_id).await {
            warn!(public_id = old_id, "Failed to delete previous image: {err:#}");
        }
    }

    images.upload(slot.folder(), file).await.map_err(|err| {
        error!("Image upload failed: {err:#}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "Image upload failed")
    })
}

#[utoipa::path(
    post,
    path = "/api/upload-image",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored in the requested slot", body = UploadResponse),
        (status = 400, description = "Missing file, wrong type or not an image", body = Message),
        (status = 401, description = "Missing, invalid or expired access token", body = Message),
        (status = 413, description = "File too large", body = Message),
        (status = 500, description = "Image host failed", body = Message)
    ),
    tag = "images"
)]
pub async fn upload_image(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    images: Extension<Arc<dyn ImageHost>>,
    limit: Extension<UploadLimit>,
    multipart: Multipart,
) -> impl IntoResponse {
    let (slot, file) = match read_upload(multipart, limit.0).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let previous = user.image_public_id(slot);
    if previous.is_some() {
        if let Err(err) = users::set_image(&pool, user.id, slot, None).await {
            error!("Failed to clear image slot: {err}");
        }
    }

    let result = match replace_image(images.0.as_ref(), previous, slot, file).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    if let Err(err) = users::set_image(
        &pool,
        user.id,
        slot,
        Some((&result.secure_url, &result.public_id)),
    )
    .await
    {
        error!("Failed to store image reference: {err}");
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Image upload failed");
    }

    info!(user_id = %user.id, slot = slot.as_str(), public_id = %result.public_id, "image stored");

    (StatusCode::OK, Json(UploadResponse { result })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mealivo::handlers::tests::json_body;
    use crate::mealivo::images::tests::FakeImageHost;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header::CONTENT_TYPE, Request},
    };

    const BOUNDARY: &str = "mealivo-boundary";

    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        content_type: Option<&'a str>,
        body: &'a [u8],
    }

    async fn multipart(parts: &[Part<'_>]) -> Multipart {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(file_name) = part.file_name {
                disposition.push_str(&format!("; filename=\"{file_name}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = part.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.body);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/upload-image")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn file_part<'a>(content_type: &'a str, body: &'a [u8]) -> Part<'a> {
        Part {
            name: "file",
            file_name: Some("me.png"),
            content_type: Some(content_type),
            body,
        }
    }

    fn type_part(value: &str) -> Part<'_> {
        Part {
            name: "type",
            file_name: None,
            content_type: None,
            body: value.as_bytes(),
        }
    }

    async fn rejection(parts: &[Part<'_>], limit: usize) -> (StatusCode, String) {
        match read_upload(multipart(parts).await, UploadLimit(limit)).await {
            Ok(_) => panic!("upload should be rejected"),
            Err(response) => {
                let status = response.status();
                let body = json_body(response).await;
                (status, body["message"].as_str().unwrap_or_default().to_string())
            }
        }
    }

    #[tokio::test]
    async fn read_upload_accepts_image() {
        let parts = [type_part("cover"), file_part("image/png", b"\x89PNG")];
        let Ok((slot, file)) = read_upload(multipart(&parts).await, UploadLimit(1024)).await else {
            panic!("upload should be accepted");
        };
        assert_eq!(slot, ImageSlot::Cover);
        assert_eq!(file.file_name, "me.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.bytes, b"\x89PNG".to_vec());
    }

    #[tokio::test]
    async fn read_upload_requires_file() {
        let (status, text) = rejection(&[type_part("profile")], 1024).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "File not found");
    }

    #[tokio::test]
    async fn read_upload_rejects_unknown_type() {
        let parts = [type_part("banner"), file_part("image/png", b"\x89PNG")];
        let (status, text) = rejection(&parts, 1024).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "File type is incorrect");
    }

    #[tokio::test]
    async fn read_upload_rejects_non_images() {
        let parts = [type_part("profile"), file_part("application/pdf", b"%PDF")];
        let (status, _) = rejection(&parts, 1024).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn read_upload_enforces_limit() {
        let big = vec![0_u8; 32];
        let parts = [type_part("profile"), file_part("image/jpeg", &big)];
        let (status, _) = rejection(&parts, 16).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    fn png() -> ImageFile {
        ImageFile {
            bytes: b"\x89PNG".to_vec(),
            file_name: "me.png".to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn uploaded(host: &FakeImageHost) -> Vec<String> {
        host.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    fn destroyed(host: &FakeImageHost) -> Vec<String> {
        host.destroyed.lock().map(|d| d.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn replace_image_deletes_previous_first() {
        let host = FakeImageHost::default();
        let Ok(result) = replace_image(&host, Some("profile/old"), ImageSlot::Profile, png()).await
        else {
            panic!("upload should succeed");
        };
        assert_eq!(result.public_id, "profile/abc");
        assert_eq!(destroyed(&host), vec!["profile/old".to_string()]);
        assert_eq!(uploaded(&host), vec!["profile/me.png".to_string()]);
    }

    #[tokio::test]
    async fn replace_image_without_previous_skips_delete() {
        let host = FakeImageHost::default();
        assert!(replace_image(&host, None, ImageSlot::Cover, png()).await.is_ok());
        assert!(destroyed(&host).is_empty());
        assert_eq!(uploaded(&host), vec!["cover/me.png".to_string()]);
    }

    #[tokio::test]
    async fn replace_image_uploads_when_delete_fails() {
        let host = FakeImageHost {
            fail_destroy: true,
            ..FakeImageHost::default()
        };
        let Ok(result) = replace_image(&host, Some("cover/old"), ImageSlot::Cover, png()).await
        else {
            panic!("a failed delete must not abort the upload");
        };
        assert_eq!(result.public_id, "cover/abc");
        assert_eq!(uploaded(&host).len(), 1);
    }

    #[tokio::test]
    async fn replace_image_maps_host_failure_to_500() {
        let host = FakeImageHost {
            fail_upload: true,
            ..FakeImageHost::default()
        };
        let Err(response) = replace_image(&host, None, ImageSlot::Profile, png()).await else {
            panic!("upload should fail");
        };
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], "Image upload failed");
    }
}
