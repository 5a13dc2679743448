use crate::core::client::{ApiRequest, ApiResponse, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::domain::model::Review;
use crate::services::ModerationDecision;
use crate::utils::error::Result;
use crate::utils::validation;
use serde_json::Value;

const REVIEWS_PATH: &str = "/reviews";
const USER_REVIEWS_PATH: &str = "/usr/reviews";
const MODERATION_PATH: &str = "/moderation/reviews";

#[derive(Debug, Clone)]
pub struct NewReview {
    pub int_xxid: String,
    pub value: u8,
    pub body: String,
}

impl NewReview {
    pub fn new(int_xxid: &str, value: u8, body: &str) -> Self {
        Self {
            int_xxid: int_xxid.to_string(),
            value,
            body: body.to_string(),
        }
    }
}

pub async fn create_review(ctx: &ClientContext, token: &str, review: &NewReview) -> Result<Review> {
    validation::validate_range("review.value", review.value, 1, 5)?;

    let value = review.value.to_string();
    let created: Review = ctx
        .on(ServiceKind::Review)
        .send(ApiRequest::post(REVIEWS_PATH).bearer(token).form([
            ("int_xxid", review.int_xxid.as_str()),
            ("value", value.as_str()),
            ("body", review.body.as_str()),
        ]))
        .await?
        .expect_success()?
        .parse()?;

    tracing::debug!("📝 Created review {} on {}", created.id, review.int_xxid);
    Ok(created)
}

pub async fn update_review(
    ctx: &ClientContext,
    token: &str,
    review_id: &str,
    value: u8,
    body: &str,
) -> Result<Review> {
    validation::validate_range("review.value", value, 1, 5)?;

    let value = value.to_string();
    ctx.on(ServiceKind::Review)
        .send(
            ApiRequest::put(format!("{}/{}", REVIEWS_PATH, review_id))
                .bearer(token)
                .form([("value", value.as_str()), ("body", body)]),
        )
        .await?
        .expect_success()?
        .parse()
}

pub async fn delete_review(ctx: &ClientContext, token: &str, review_id: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Review)
        .send(ApiRequest::delete(format!("{}/{}", REVIEWS_PATH, review_id)).bearer(token))
        .await
}

/// 目前登入使用者的所有評論
pub async fn user_reviews(ctx: &ClientContext, token: &str) -> Result<Vec<Review>> {
    let response = ctx
        .on(ServiceKind::Review)
        .send(ApiRequest::get(USER_REVIEWS_PATH).bearer(token))
        .await?
        .expect_success()?;
    Ok(serde_json::from_value(response.field("reviews")?.clone())?)
}

pub async fn respond_to_review(
    ctx: &ClientContext,
    token: &str,
    review_id: &str,
    body: &str,
) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Review)
        .send(
            ApiRequest::post(format!("{}/{}/responses", REVIEWS_PATH, review_id))
                .bearer(token)
                .form([("body", body)]),
        )
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}

pub async fn moderate_review(
    ctx: &ClientContext,
    moderator_token: &str,
    review_id: &str,
    decision: &ModerationDecision,
) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Review)
        .send(
            ApiRequest::put(format!("{}/{}", MODERATION_PATH, review_id))
                .bearer(moderator_token)
                .form(decision.form_fields()),
        )
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}
