use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProductMetrics {
    pub approved: u64,
    pub pending: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserMetrics {
    pub buyers: u64,
    pub sellers: u64,
    pub admins: u64,
    pub banned: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetrics {
    pub total: u64,
    pub revenue: f64,
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Dashboard {
    pub products: ProductMetrics,
    pub users: UserMetrics,
    pub orders: OrderMetrics,
}
