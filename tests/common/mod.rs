#![allow(dead_code)]

use httpmock::prelude::*;
use serde_json::json;
use svc_e2e::SuiteConfig;

pub const USER_ID: &str = "u-100";
pub const ACCESS_TOKEN: &str = "token-abc";
pub const BUSINESS_ID: &str = "biz-1";

/// 所有服務都指向同一個 mock server 的設定
pub fn suite_config(server: &MockServer, tail: &str) -> SuiteConfig {
    let base = server.base_url();
    let content = format!(
        r#"
[suite]
name = "mock-suite"

[services]
listing = "{base}"
review = "{base}"
account = "{base}"
media = "{base}"
promotions = "{base}"
profile = "{base}"
notification = "{base}"

[auth]
client_id = "e2e-client"
client_secret = "e2e-secret"
moderator_token = "mod-token"

[polling]
timeout_seconds = 1
interval_millis = 20

{tail}
"#
    );
    SuiteConfig::from_toml_str(&content).expect("mock suite config should parse")
}

pub fn business_fixture() -> &'static str {
    r#"
[fixtures]
business_id = "biz-1"
"#
}

/// 註冊與登入的 mock；回傳 (register, token)
pub async fn mock_user_creation<'a>(server: &'a MockServer) -> (httpmock::Mock<'a>, httpmock::Mock<'a>) {
    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/usr/register")
                .body_contains("first_name=E2E");
            then.status(201).json_body(json!({ "id": USER_ID }));
        })
        .await;

    let token = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .body_contains("grant_type=password")
                .body_contains("client_id=e2e-client");
            then.status(200).json_body(json!({
                "access_token": ACCESS_TOKEN,
                "refresh_token": "refresh-abc",
                "expires_in": 3600
            }));
        })
        .await;

    (register, token)
}

pub async fn mock_business_detail(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/business/{}", BUSINESS_ID));
            then.status(200)
                .json_body(json!({ "int_xxid": BUSINESS_ID, "name": "Mock Diner", "city": "Springfield" }));
        })
        .await
}

pub async fn mock_account_deletion(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/usr")
                .header("authorization", format!("Bearer {}", ACCESS_TOKEN));
            then.status(204);
        })
        .await
}
