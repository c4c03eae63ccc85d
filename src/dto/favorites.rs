use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Favorite, TargetType};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct FavoriteRequest {
    #[serde(alias = "targetType")]
    pub target_type: TargetType,
    #[serde(alias = "targetId")]
    pub target_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FavoriteList {
    #[schema(value_type = Vec<Favorite>)]
    pub items: Vec<Favorite>,
}
