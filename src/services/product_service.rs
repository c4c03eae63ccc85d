use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func},
};

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{CartItems, ProductImages, Products, cart_items, product_images, products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin, ensure_role},
    models::{Product, Role},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::product_image_service,
    state::AppState,
};

fn validate_price(price: f64) -> AppResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::BadRequest("price must be a number >= 0".into()));
    }
    Ok(price)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn filter_condition(query: &ProductQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(products::Column::Name))).like(pattern.as_str()))
                .add(Expr::expr(Func::lower(Expr::col(products::Column::Kind))).like(pattern.as_str())),
        );
    }
    if let Some(kind) = query.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        condition = condition.add(products::Column::Kind.eq(kind));
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        condition = condition.add(products::Column::Category.eq(category));
    }
    if let Some(min) = query.min_price {
        condition = condition.add(products::Column::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(products::Column::Price.lte(max));
    }
    if let Some(seller_id) = query.seller_id {
        condition = condition.add(products::Column::SellerId.eq(seller_id));
    }
    if let Some(approved) = query.approved {
        condition = condition.add(products::Column::Approved.eq(approved));
    }
    condition
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, page_size, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(filter_condition(&query))
        .order_by_desc(products::Column::CreatedAt)
        .order_by_desc(products::Column::Id);

    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}

pub async fn find_product(state: &AppState, id: i32) -> AppResult<products::Model> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn get_product(state: &AppState, id: i32) -> AppResult<ApiResponse<Product>> {
    let product = find_product(state, id).await?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

pub async fn create_product(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_role(actor, &[Role::Seller, Role::Admin])?;

    let (Some(name), Some(kind)) = (non_blank(payload.name), non_blank(payload.kind)) else {
        return Err(AppError::BadRequest("name and type are required".into()));
    };
    let price = validate_price(
        payload
            .price
            .ok_or_else(|| AppError::BadRequest("price is required".into()))?,
    )?;

    let product = products::ActiveModel {
        name: Set(name),
        kind: Set(kind),
        category: Set(non_blank(payload.category)),
        price: Set(price),
        seller_id: Set(Some(actor.user_id)),
        approved: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success("Product created", Product::from(product), None))
}

pub async fn update_product(
    state: &AppState,
    actor: &AuthUser,
    id: i32,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(state, id).await?;
    ensure_owner_or_admin(actor, existing.seller_id)?;

    let price = payload.price.map(validate_price).transpose()?;
    let name = non_blank(payload.name);
    let kind = non_blank(payload.kind);
    let category = payload.category.map(|c| c.trim().to_string());

    if name.is_none() && kind.is_none() && category.is_none() && price.is_none() {
        return Ok(ApiResponse::success("Updated", Product::from(existing), None));
    }

    let mut active = existing.into_active_model();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(kind) = kind {
        active.kind = Set(kind);
    }
    if let Some(category) = category {
        active.category = Set((!category.is_empty()).then_some(category));
    }
    if let Some(price) = price {
        active.price = Set(price);
    }
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", Product::from(product), None))
}

pub async fn delete_product(state: &AppState, actor: &AuthUser, id: i32) -> AppResult<()> {
    let product = find_product(state, id).await?;
    ensure_owner_or_admin(actor, product.seller_id)?;

    let images = ProductImages::find()
        .filter(product_images::Column::ProductId.eq(id))
        .all(&state.orm)
        .await?;

    let txn = state.orm.begin().await?;
    ProductImages::delete_many()
        .filter(product_images::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    CartItems::delete_many()
        .filter(cart_items::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product.delete(&txn).await?;
    txn.commit().await?;

    for image in &images {
        product_image_service::remove_stored_file(state, image).await;
    }

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_or_non_finite_prices() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(19.9).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }
}
