use crate::config::suite_config::FixtureConfig;
use crate::core::client::{ApiRequest, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::core::poll::Poller;
use crate::domain::model::Business;
use crate::utils::error::{E2eError, Result};
use serde_json::Value;

const SEARCH_PATH: &str = "/search";

/// 以關鍵字與地點搜尋商家
pub async fn search(ctx: &ClientContext, what: &str, where_: &str) -> Result<Vec<Business>> {
    let response = ctx
        .on(ServiceKind::Listing)
        .send(
            ApiRequest::get(SEARCH_PATH)
                .query("what", what)
                .query("where", where_),
        )
        .await?
        .expect_success()?;

    let results = match response.json()?.get("results") {
        Some(results) => serde_json::from_value(results.clone())?,
        None => Vec::new(),
    };
    Ok(results)
}

pub async fn business_detail(ctx: &ClientContext, int_xxid: &str) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Listing)
        .get(&format!("/business/{}", int_xxid))
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}

/// 搜尋結果可能還在索引中，輪詢到第一筆出現為止
pub async fn find_business(
    ctx: &ClientContext,
    poller: &Poller,
    what: &str,
    where_: &str,
) -> Result<Business> {
    poller
        .until(&format!("search results for '{}' in '{}'", what, where_), move || async move {
            Ok(search(ctx, what, where_).await?.into_iter().next())
        })
        .await
}

/// 依 fixture 設定取得測試用商家：優先使用固定 id，否則搜尋
pub async fn resolve_business(
    ctx: &ClientContext,
    poller: &Poller,
    fixtures: &FixtureConfig,
) -> Result<Business> {
    if let Some(int_xxid) = &fixtures.business_id {
        let detail = business_detail(ctx, int_xxid).await?;
        let name = detail
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Ok(Business {
            int_xxid: int_xxid.clone(),
            name,
            city: detail.get("city").and_then(Value::as_str).map(str::to_string),
        });
    }

    match (&fixtures.search_what, &fixtures.search_where) {
        (Some(what), Some(where_)) => find_business(ctx, poller, what, where_).await,
        _ => Err(E2eError::MissingConfigError {
            field: "fixtures.business_id or fixtures.search_what/search_where".to_string(),
        }),
    }
}
