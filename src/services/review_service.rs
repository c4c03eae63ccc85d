use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, ReplyReviewRequest, ReviewList, ReviewSummary},
    entity::{Products, Reviews, Users, reviews},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NotificationKind, Review, Role, TargetType},
    response::{ApiResponse, Meta},
    routes::params::{ReviewQuery, ReviewTargetQuery},
    services::notification_service::notify,
    state::AppState,
};

const MAX_TEXT_CHARS: usize = 1000;

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| truncate_chars(t.trim(), MAX_TEXT_CHARS))
        .filter(|t| !t.is_empty())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resolves who answers for a review target: the product's seller, or the
/// seller account itself. Missing targets are a 404.
async fn target_owner<C: ConnectionTrait>(
    conn: &C,
    target_type: TargetType,
    target_id: i32,
) -> AppResult<Option<i32>> {
    match target_type {
        TargetType::Product => {
            let product = Products::find_by_id(target_id)
                .one(conn)
                .await?
                .ok_or_else(|| AppError::not_found("Product"))?;
            Ok(product.seller_id)
        }
        TargetType::Seller => {
            let seller = Users::find_by_id(target_id)
                .one(conn)
                .await?
                .filter(|u| u.role == Role::Seller)
                .ok_or_else(|| AppError::not_found("Seller"))?;
            Ok(Some(seller.id))
        }
    }
}

pub async fn create_review(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let target_type: TargetType = payload
        .target_type
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::BadRequest("target_type must be product or seller".into()))?;
    let target_id = payload
        .target_id
        .ok_or_else(|| AppError::BadRequest("target_id is required".into()))?;
    let rating = payload
        .rating
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| AppError::BadRequest("rating must be between 1 and 5".into()))?;

    let txn = state.orm.begin().await?;
    let owner = target_owner(&txn, target_type, target_id).await?;

    let review = reviews::ActiveModel {
        target_type: Set(target_type),
        target_id: Set(target_id),
        buyer_id: Set(actor.user_id),
        rating: Set(rating),
        comment: Set(clean_text(payload.comment)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(owner_id) = owner.filter(|id| *id != actor.user_id) {
        notify(
            &txn,
            owner_id,
            NotificationKind::Review,
            "New review",
            &format!("You received a {rating}-star review"),
            Some(serde_json::json!({
                "review_id": review.id,
                "target_type": target_type,
                "target_id": target_id,
            })),
        )
        .await?;
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "rating": rating }),
    )
    .await;

    Ok(ApiResponse::success("Review created", Review::from(review), None))
}

pub async fn list_reviews(state: &AppState, query: ReviewQuery) -> AppResult<ApiResponse<ReviewList>> {
    let (target_type, target_id) = query.target();
    let (page, page_size, offset) = query.pagination().normalize();

    let finder = Reviews::find()
        .filter(reviews::Column::TargetType.eq(target_type))
        .filter(reviews::Column::TargetId.eq(target_id))
        .order_by_desc(reviews::Column::CreatedAt)
        .order_by_desc(reviews::Column::Id);

    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        ReviewList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}

pub async fn summary(state: &AppState, query: ReviewTargetQuery) -> AppResult<ApiResponse<ReviewSummary>> {
    let (target_type, target_id) = query.target();
    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(reviews::Column::Rating)
        .filter(reviews::Column::TargetType.eq(target_type))
        .filter(reviews::Column::TargetId.eq(target_id))
        .into_tuple()
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success("OK", summarize(&ratings), None))
}

fn summarize(ratings: &[i32]) -> ReviewSummary {
    if ratings.is_empty() {
        return ReviewSummary { count: 0, avg: 0.0 };
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    ReviewSummary {
        count: ratings.len() as u64,
        avg: round2(sum as f64 / ratings.len() as f64),
    }
}

pub async fn reply(
    state: &AppState,
    actor: &AuthUser,
    id: i32,
    payload: ReplyReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let message = clean_text(payload.message)
        .ok_or_else(|| AppError::BadRequest("message is required".into()))?;

    let txn = state.orm.begin().await?;
    let review = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;

    if !actor.is_admin() {
        let owner = target_owner(&txn, review.target_type, review.target_id).await?;
        if owner != Some(actor.user_id) {
            return Err(AppError::forbidden());
        }
    }
    if review.reply_message.is_some() {
        return Err(AppError::Conflict("Review already has a reply".into()));
    }

    let buyer_id = review.buyer_id;
    let mut active = review.into_active_model();
    active.reply_seller_id = Set(Some(actor.user_id));
    active.reply_message = Set(Some(message));
    active.replied_at = Set(Some(Utc::now()));
    let updated = active.update(&txn).await?;

    notify(
        &txn,
        buyer_id,
        NotificationKind::Review,
        "Your review got a reply",
        "The seller replied to your review",
        Some(serde_json::json!({ "review_id": updated.id })),
    )
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "review_reply",
        "reviews",
        serde_json::json!({ "review_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success("Reply added", Review::from(updated), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rounds_to_two_decimals() {
        assert_eq!(summarize(&[]), ReviewSummary { count: 0, avg: 0.0 });
        assert_eq!(summarize(&[5, 4, 4]), ReviewSummary { count: 3, avg: 4.33 });
        assert_eq!(summarize(&[1, 2]), ReviewSummary { count: 2, avg: 1.5 });
    }

    #[test]
    fn text_is_trimmed_and_capped() {
        assert_eq!(clean_text(Some("   ".into())), None);
        assert_eq!(clean_text(Some(" ok ".into())).as_deref(), Some("ok"));
        let long = "é".repeat(MAX_TEXT_CHARS + 50);
        assert_eq!(clean_text(Some(long)).map(|t| t.chars().count()), Some(MAX_TEXT_CHARS));
    }
}
