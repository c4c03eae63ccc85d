use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{StatusCode, header},
    routing::{delete, get},
};

use crate::{
    dto::product_images::{ImageLinkRequest, ImageUploadForm, ProductImageList},
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, extract::{AppJson, AppPath}},
    models::ProductImage,
    response::ApiResponse,
    services::product_image_service::{self, ImageUpload},
    state::AppState,
};

/// Mounted under `/products`, next to the product routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/images",
            get(list_images)
                .post(upload_image)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/{id}/images/{image_id}", delete(delete_image))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".into())
    } else {
        tracing::debug!(error = %err.body_text(), "rejected multipart body");
        AppError::BadRequest("Invalid multipart body".into())
    }
}

/// Reads the `file` field, stopping as soon as it grows past `max_bytes`.
async fn read_file_field(mut multipart: Multipart, max_bytes: usize) -> AppResult<Option<ImageUpload>> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::PayloadTooLarge("File too large".into()));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(ImageUpload { original_name, bytes }));
    }
    Ok(None)
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/images",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Images of a product", body = ApiResponse<ProductImageList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Product images"
)]
pub async fn list_images(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<ProductImageList>>> {
    let resp = product_image_service::list_images(&state, id).await?;
    Ok(Json(resp))
}

/// Accepts either a multipart form with a `file` field or a JSON
/// `{filename, url}` body pointing at an image hosted elsewhere.
#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(
        content(
            (ImageUploadForm = "multipart/form-data"),
            (ImageLinkRequest = "application/json"),
        )
    ),
    responses(
        (status = 201, description = "Image stored", body = ApiResponse<ProductImage>),
        (status = 400, description = "Missing file or filename/url, or a link into /uploads"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
        (status = 413, description = "File too large"),
    ),
    security(("bearer_auth" = [])),
    tag = "Product images"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    request: Request,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductImage>>)> {
    // Reject strangers before reading a potentially large body.
    let product = product_image_service::authorize(&state, &user, id).await?;

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let resp = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "rejected multipart body");
                AppError::BadRequest("Invalid multipart body".into())
            })?;
        let upload = read_file_field(multipart, state.config.upload_max_bytes)
            .await?
            .ok_or_else(|| AppError::BadRequest("Missing file or filename/url".into()))?;
        product_image_service::save_upload(&state, &user, &product, upload).await?
    } else {
        let AppJson(payload) = AppJson::<ImageLinkRequest>::from_request(request, &state).await?;
        product_image_service::add_image_link(&state, &user, &product, payload).await?
    };

    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/images/{image_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Image not found on this product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Product images"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((id, image_id)): AppPath<(i32, i32)>,
) -> AppResult<StatusCode> {
    product_image_service::delete_image(&state, &user, id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
