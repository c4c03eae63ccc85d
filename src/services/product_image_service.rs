use std::path::{Path, PathBuf};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::product_images::{ImageLinkRequest, ProductImageList},
    entity::{ProductImages, product_images, products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::ProductImage,
    response::ApiResponse,
    services::product_service::find_product,
    state::AppState,
};

pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// A file received through the multipart upload form.
#[derive(Debug)]
pub struct ImageUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Keeps a short alphanumeric extension from the client's file name, if any.
fn stored_file_name(original_name: &str) -> String {
    let id = Uuid::new_v4().simple();
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());
    match extension {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Resolves a stored name inside the upload directory. Anything that could
/// escape the directory yields `None`.
fn local_path(upload_dir: &str, stored_name: &str) -> Option<PathBuf> {
    if stored_name.is_empty() || stored_name.contains(['/', '\\']) || stored_name.starts_with('.') {
        return None;
    }
    Some(Path::new(upload_dir).join(stored_name))
}

/// Removes a file this service saved. Only rows created by an upload carry a
/// stored name, so link rows never touch the disk.
pub async fn remove_stored_file(state: &AppState, image: &product_images::Model) {
    let Some(path) = image
        .stored_name
        .as_deref()
        .and_then(|name| local_path(&state.config.upload_dir, name))
    else {
        return;
    };
    if let Err(err) = tokio::fs::remove_file(&path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %err, path = %path.display(), "failed to remove uploaded file");
        }
    }
}

/// Loads the product and checks that the actor may manage its images.
pub async fn authorize(state: &AppState, actor: &AuthUser, product_id: i32) -> AppResult<products::Model> {
    let product = find_product(state, product_id).await?;
    ensure_owner_or_admin(actor, product.seller_id)?;
    Ok(product)
}

pub async fn list_images(state: &AppState, product_id: i32) -> AppResult<ApiResponse<ProductImageList>> {
    find_product(state, product_id).await?;
    let items = ProductImages::find()
        .filter(product_images::Column::ProductId.eq(product_id))
        .order_by_asc(product_images::Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();
    Ok(ApiResponse::success("OK", ProductImageList { items }, None))
}

async fn insert_image(
    state: &AppState,
    actor: &AuthUser,
    product_id: i32,
    filename: String,
    url: String,
    stored_name: Option<String>,
) -> AppResult<ProductImage> {
    let image = product_images::ActiveModel {
        product_id: Set(product_id),
        filename: Set(filename),
        url: Set(url),
        stored_name: Set(stored_name),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "product_image_add",
        "product_images",
        serde_json::json!({ "product_id": product_id, "image_id": image.id }),
    )
    .await;

    Ok(ProductImage::from(image))
}

/// Links an image hosted elsewhere. `product` must come from [`authorize`].
pub async fn add_image_link(
    state: &AppState,
    actor: &AuthUser,
    product: &products::Model,
    payload: ImageLinkRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    let filename = payload.filename.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
    let url = payload.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    let (Some(filename), Some(url)) = (filename, url) else {
        return Err(AppError::BadRequest("Missing file or filename/url".into()));
    };
    if url.starts_with(UPLOAD_URL_PREFIX) {
        return Err(AppError::BadRequest(
            "Files under /uploads can only be added by uploading them".into(),
        ));
    }

    let image = insert_image(state, actor, product.id, filename, url, None).await?;
    Ok(ApiResponse::success("Image added", image, None))
}

/// Saves an uploaded file for `product`, which must come from [`authorize`].
pub async fn save_upload(
    state: &AppState,
    actor: &AuthUser,
    product: &products::Model,
    upload: ImageUpload,
) -> AppResult<ApiResponse<ProductImage>> {
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if upload.bytes.len() > state.config.upload_max_bytes {
        return Err(AppError::PayloadTooLarge("File too large".into()));
    }

    let stored_name = stored_file_name(&upload.original_name);
    let dir = Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(dir.join(&stored_name), &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let filename = if upload.original_name.trim().is_empty() {
        stored_name.clone()
    } else {
        upload.original_name
    };
    let url = format!("{UPLOAD_URL_PREFIX}{stored_name}");

    let image = insert_image(state, actor, product.id, filename, url, Some(stored_name)).await?;
    Ok(ApiResponse::success("Image uploaded", image, None))
}

pub async fn delete_image(
    state: &AppState,
    actor: &AuthUser,
    product_id: i32,
    image_id: i32,
) -> AppResult<()> {
    let image = ProductImages::find_by_id(image_id)
        .filter(product_images::Column::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Image"))?;
    authorize(state, actor, product_id).await?;

    image.clone().delete(&state.orm).await?;
    remove_stored_file(state, &image).await;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "product_image_delete",
        "product_images",
        serde_json::json!({ "product_id": product_id, "image_id": image_id }),
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_keep_safe_extensions() {
        assert!(stored_file_name("photo.PNG").ends_with(".png"));
        assert!(!stored_file_name("archive.tar.g$z").contains('$'));
        assert!(!stored_file_name("noext").contains('.'));
        assert_ne!(stored_file_name("a.jpg"), stored_file_name("a.jpg"));
    }

    #[test]
    fn stored_names_stay_inside_the_upload_dir() {
        assert_eq!(local_path("uploads", "abc.png"), Some(PathBuf::from("uploads/abc.png")));
        assert_eq!(local_path("uploads", "../secret"), None);
        assert_eq!(local_path("uploads", "nested/a.png"), None);
        assert_eq!(local_path("uploads", ".env"), None);
        assert_eq!(local_path("uploads", ""), None);
    }
}
