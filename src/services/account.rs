use crate::config::suite_config::AuthConfig;
use crate::core::client::{ApiRequest, ApiResponse, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::domain::model::{Address, OAuthToken};
use crate::utils::error::Result;
use serde_json::Value;

const REGISTER_PATH: &str = "/usr/register";
const TOKEN_PATH: &str = "/oauth/token";
const PROFILE_PATH: &str = "/usr/profile";
const ADDRESSES_PATH: &str = "/usr/addresses";
const ACCOUNT_PATH: &str = "/usr";

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// 註冊帳號，回傳新使用者 id
pub async fn register(ctx: &ClientContext, registration: &Registration) -> Result<String> {
    let response = ctx
        .on(ServiceKind::Account)
        .send(ApiRequest::post(REGISTER_PATH).form([
            ("email", registration.email.as_str()),
            ("password", registration.password.as_str()),
            ("first_name", registration.first_name.as_str()),
            ("last_name", registration.last_name.as_str()),
        ]))
        .await?
        .expect_success()?;

    let id = response.str_field("id")?;
    tracing::debug!("👤 Registered {} as {}", registration.email, id);
    Ok(id)
}

/// 以帳號密碼換取 OAuth token（password grant）
pub async fn request_token(
    ctx: &ClientContext,
    auth: &AuthConfig,
    email: &str,
    password: &str,
) -> Result<OAuthToken> {
    ctx.on(ServiceKind::Account)
        .send(ApiRequest::post(TOKEN_PATH).form([
            ("grant_type", "password"),
            ("username", email),
            ("password", password),
            ("client_id", auth.client_id.as_str()),
            ("client_secret", auth.client_secret.as_str()),
        ]))
        .await?
        .expect_success()?
        .parse()
}

pub async fn refresh_token(
    ctx: &ClientContext,
    auth: &AuthConfig,
    refresh_token: &str,
) -> Result<OAuthToken> {
    ctx.on(ServiceKind::Account)
        .send(ApiRequest::post(TOKEN_PATH).form([
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", auth.client_id.as_str()),
            ("client_secret", auth.client_secret.as_str()),
        ]))
        .await?
        .expect_success()?
        .parse()
}

pub async fn profile(ctx: &ClientContext, token: &str) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Account)
        .send(ApiRequest::get(PROFILE_PATH).bearer(token))
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}

pub async fn update_profile(ctx: &ClientContext, token: &str, changes: Value) -> Result<Value> {
    let response = ctx
        .on(ServiceKind::Account)
        .send(ApiRequest::put(PROFILE_PATH).bearer(token).json(changes))
        .await?
        .expect_success()?;
    Ok(response.json()?.clone())
}

pub async fn addresses(ctx: &ClientContext, token: &str) -> Result<Vec<Address>> {
    let response = ctx
        .on(ServiceKind::Account)
        .send(ApiRequest::get(ADDRESSES_PATH).bearer(token))
        .await?
        .expect_success()?;
    Ok(serde_json::from_value(response.field("addresses")?.clone())?)
}

pub async fn add_address(ctx: &ClientContext, token: &str, address: &Address) -> Result<Address> {
    ctx.on(ServiceKind::Account)
        .send(
            ApiRequest::post(ADDRESSES_PATH)
                .bearer(token)
                .json(serde_json::to_value(address)?),
        )
        .await?
        .expect_success()?
        .parse()
}

/// 刪除類 helper 回傳原始回應，讓 teardown 自行判斷 404
pub async fn delete_address(ctx: &ClientContext, token: &str, address_id: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Account)
        .send(ApiRequest::delete(format!("{}/{}", ADDRESSES_PATH, address_id)).bearer(token))
        .await
}

pub async fn delete_account(ctx: &ClientContext, token: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Account)
        .send(ApiRequest::delete(ACCOUNT_PATH).bearer(token))
        .await
}
