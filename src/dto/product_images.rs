use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProductImage;

/// Registers an image hosted elsewhere instead of uploading a file.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageLinkRequest {
    pub filename: Option<String>,
    pub url: Option<String>,
}

/// Multipart form accepted by the upload endpoint.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductImageList {
    #[schema(value_type = Vec<ProductImage>)]
    pub items: Vec<ProductImage>,
}
