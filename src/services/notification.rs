use crate::core::assertions::StatusCategory;
use crate::core::client::{ApiRequest, ClientContext};
use crate::core::endpoint::ServiceKind;
use crate::utils::error::{E2eError, Result};
use serde_json::{json, Value};

const VERIFY_PATH: &str = "/email/verify";

/// 觸發交易型 email（例如 welcome、password_reset）
pub async fn send_email(ctx: &ClientContext, token: &str, template: &str, payload: Value) -> Result<()> {
    ctx.on(ServiceKind::Notification)
        .send(
            ApiRequest::post(format!("/email/{}", template))
                .bearer(token)
                .json(payload),
        )
        .await?
        .expect_success()?;
    Ok(())
}

pub async fn request_verification(ctx: &ClientContext, token: &str) -> Result<()> {
    ctx.on(ServiceKind::Notification)
        .send(ApiRequest::post(VERIFY_PATH).bearer(token))
        .await?
        .expect_success()?;
    Ok(())
}

/// 驗證連結會 redirect 到落地頁，回傳 Location
pub async fn confirm_verification(ctx: &ClientContext, code: &str) -> Result<String> {
    let response = ctx
        .on(ServiceKind::Notification)
        .get(&format!("{}/{}", VERIFY_PATH, code))
        .await?
        .expect_category(StatusCategory::Redirect)?;

    response
        .header("location")
        .map(str::to_string)
        .ok_or_else(|| E2eError::AssertionFailed {
            message: format!("redirect from {} has no Location header", response.url),
        })
}

pub async fn share_business(
    ctx: &ClientContext,
    token: &str,
    int_xxid: &str,
    recipient: &str,
    message: &str,
) -> Result<()> {
    ctx.on(ServiceKind::Notification)
        .send(ApiRequest::post("/share").bearer(token).json(json!({
            "int_xxid": int_xxid,
            "recipient": recipient,
            "message": message,
        })))
        .await?
        .expect_success()?;
    Ok(())
}
