use crate::core::assertions;
use crate::core::client::{ApiRequest, ApiResponse, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::domain::model::{LeaderboardEntry, Promo};
use crate::services::ModerationDecision;
use crate::utils::error::Result;
use serde_json::{json, Value};

const PROMOS_PATH: &str = "/promos";

pub async fn promo(ctx: &ClientContext, code: &str) -> Result<Promo> {
    ctx.on(ServiceKind::Promotions)
        .get(&format!("{}/{}", PROMOS_PATH, code))
        .await?
        .expect_success()?
        .parse()
}

pub async fn create_promo(ctx: &ClientContext, moderator_token: &str, code: &str, name: &str) -> Result<Promo> {
    ctx.on(ServiceKind::Promotions)
        .send(
            ApiRequest::post(PROMOS_PATH)
                .bearer(moderator_token)
                .json(json!({ "code": code, "name": name })),
        )
        .await?
        .expect_success()?
        .parse()
}

pub async fn delete_promo(ctx: &ClientContext, moderator_token: &str, code: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Promotions)
        .send(ApiRequest::delete(format!("{}/{}", PROMOS_PATH, code)).bearer(moderator_token))
        .await
}

/// 列出以 prefix 開頭的 promo；服務端若忽略篩選條件，這裡再過濾一次
pub async fn promos_with_prefix(
    ctx: &ClientContext,
    moderator_token: &str,
    prefix: &str,
) -> Result<Vec<Promo>> {
    let response = ctx
        .on(ServiceKind::Promotions)
        .send(
            ApiRequest::get(PROMOS_PATH)
                .bearer(moderator_token)
                .query("prefix", prefix),
        )
        .await?
        .expect_success()?;

    let promos: Vec<Promo> = serde_json::from_value(response.field("promos")?.clone())?;
    Ok(promos
        .into_iter()
        .filter(|promo| promo.code.starts_with(prefix))
        .collect())
}

pub async fn enroll(ctx: &ClientContext, token: &str, code: &str) -> Result<()> {
    ctx.on(ServiceKind::Promotions)
        .send(ApiRequest::post(format!("{}/{}/enroll", PROMOS_PATH, code)).bearer(token))
        .await?
        .expect_success()?;
    Ok(())
}

/// 某商家在 promo 中可獲得的點數
pub async fn business_points(ctx: &ClientContext, code: &str, int_xxid: &str) -> Result<i64> {
    let response = ctx
        .on(ServiceKind::Promotions)
        .send(ApiRequest::get(format!("{}/{}/points", PROMOS_PATH, code)).query("int_xxid", int_xxid))
        .await?
        .expect_success()?;
    assertions::value_as_i64(response.field("points")?, "points")
}

pub async fn leaderboard(ctx: &ClientContext, code: &str) -> Result<Vec<LeaderboardEntry>> {
    let response = ctx
        .on(ServiceKind::Promotions)
        .get(&format!("{}/{}/leaderboard", PROMOS_PATH, code))
        .await?
        .expect_success()?;
    Ok(serde_json::from_value(response.field("teams")?.clone())?)
}

pub fn team_points(entries: &[LeaderboardEntry], team_id: &str) -> Option<i64> {
    entries
        .iter()
        .find(|entry| entry.team_id == team_id)
        .map(|entry| entry.contributed_points)
}

pub async fn assign_team(
    ctx: &ClientContext,
    token: &str,
    code: &str,
    team_id: &str,
    user_id: &str,
) -> Result<()> {
    ctx.on(ServiceKind::Promotions)
        .send(
            ApiRequest::post(format!("{}/{}/teams/{}/members", PROMOS_PATH, code, team_id))
                .bearer(token)
                .form([("user_id", user_id)]),
        )
        .await?
        .expect_success()?;
    tracing::debug!("🏷️ Assigned user {} to team {} in {}", user_id, team_id, code);
    Ok(())
}

pub async fn contributions(ctx: &ClientContext, moderator_token: &str, code: &str) -> Result<Vec<Value>> {
    let response = ctx
        .on(ServiceKind::Promotions)
        .send(ApiRequest::get(format!("{}/{}/contributions", PROMOS_PATH, code)).bearer(moderator_token))
        .await?
        .expect_success()?;
    Ok(assertions::array_at(response.json()?, "contributions")?.clone())
}

pub async fn moderate_contribution(
    ctx: &ClientContext,
    moderator_token: &str,
    code: &str,
    contribution_id: &str,
    decision: &ModerationDecision,
) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Promotions)
        .send(
            ApiRequest::put(format!(
                "{}/{}/contributions/{}",
                PROMOS_PATH, code, contribution_id
            ))
            .bearer(moderator_token)
            .form(decision.form_fields()),
        )
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}
