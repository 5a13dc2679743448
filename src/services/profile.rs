use crate::core::client::{ApiRequest, ApiResponse, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::domain::model::Collection;
use crate::utils::error::Result;
use serde_json::Value;

const COLLECTIONS_PATH: &str = "/collections";

pub async fn public_profile(ctx: &ClientContext, user_id: &str) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Profile)
        .get(&format!("/profiles/{}", user_id))
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}

pub async fn create_collection(ctx: &ClientContext, token: &str, name: &str) -> Result<Collection> {
    ctx.on(ServiceKind::Profile)
        .send(
            ApiRequest::post(COLLECTIONS_PATH)
                .bearer(token)
                .form([("name", name)]),
        )
        .await?
        .expect_success()?
        .parse()
}

pub async fn add_to_collection(
    ctx: &ClientContext,
    token: &str,
    collection_id: &str,
    int_xxid: &str,
) -> Result<()> {
    ctx.on(ServiceKind::Profile)
        .send(
            ApiRequest::post(format!("{}/{}/items", COLLECTIONS_PATH, collection_id))
                .bearer(token)
                .form([("int_xxid", int_xxid)]),
        )
        .await?
        .expect_success()?;
    Ok(())
}

pub async fn delete_collection(ctx: &ClientContext, token: &str, collection_id: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Profile)
        .send(ApiRequest::delete(format!("{}/{}", COLLECTIONS_PATH, collection_id)).bearer(token))
        .await
}
