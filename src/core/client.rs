use crate::config::suite_config::SuiteConfig;
use crate::core::assertions::StatusCategory;
use crate::core::endpoint::{EndpointRegistry, ServiceKind};
use crate::utils::error::{E2eError, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const BODY_SNIPPET_LEN: usize = 300;

/// 請求內容
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
    Multipart(MultipartUpload),
}

/// 檔案上傳（multipart/form-data）
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub fields: Vec<(String, String)>,
}

impl MultipartUpload {
    pub fn new(field: &str, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            field: field.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    fn into_form(self) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?;

        let mut form = reqwest::multipart::Form::new().part(self.field, part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// 與服務無關的請求描述；由 ClientContext 決定送往哪個服務
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, upload: MultipartUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }

    /// 以指定使用者身分送出（覆蓋 context 預設的 token）
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn bearer_opt(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.bearer(token),
            None => self,
        }
    }
}

/// 已接收的回應：原始 body 與解析後的 JSON 同時保留
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub service: ServiceKind,
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub json: Option<Value>,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn category(&self) -> StatusCategory {
        StatusCategory::from_status(self.status)
    }

    pub fn body_snippet(&self) -> String {
        if self.body.chars().count() <= BODY_SNIPPET_LEN {
            self.body.clone()
        } else {
            let snippet: String = self.body.chars().take(BODY_SNIPPET_LEN).collect();
            format!("{}...", snippet)
        }
    }

    pub fn json(&self) -> Result<&Value> {
        self.json.as_ref().ok_or_else(|| E2eError::InvalidJson {
            url: self.url.to_string(),
            message: format!("body was: {}", self.body_snippet()),
        })
    }

    /// 以點號路徑取值，例如 `reviews.0.value`
    pub fn field(&self, path: &str) -> Result<&Value> {
        crate::core::assertions::lookup(self.json()?, path)
    }

    pub fn str_field(&self, path: &str) -> Result<String> {
        crate::core::assertions::value_as_string(self.field(path)?, path)
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.json()?.clone())?)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn expect_category(self, expected: StatusCategory) -> Result<Self> {
        if self.category() == expected {
            Ok(self)
        } else {
            Err(self.unexpected(expected.to_string()))
        }
    }

    pub fn expect_success(self) -> Result<Self> {
        self.expect_category(StatusCategory::Success)
    }

    pub fn expect_status(self, expected: u16) -> Result<Self> {
        if self.status_code() == expected {
            Ok(self)
        } else {
            Err(self.unexpected(expected.to_string()))
        }
    }

    fn unexpected(&self, expected: String) -> E2eError {
        E2eError::UnexpectedStatus {
            service: self.service.to_string(),
            method: self.method.to_string(),
            url: self.url.to_string(),
            expected,
            actual: self.status_code(),
            body: self.body_snippet(),
        }
    }
}

/// 每個情境各自擁有的 HTTP context
///
/// 目前選定的服務存在這個值裡，而非全域變數；切換後所有經由
/// context 的呼叫都會送往該服務，直到下一次切換為止。
#[derive(Debug, Clone)]
pub struct ClientContext {
    client: Client,
    registry: Arc<EndpointRegistry>,
    current: Option<ServiceKind>,
    bearer: Option<String>,
    default_headers: Vec<(String, String)>,
    timeout: Duration,
}

impl ClientContext {
    pub fn new(registry: Arc<EndpointRegistry>, timeout: Duration, user_agent: &str) -> Result<Self> {
        // 不跟隨 redirect，才能斷言 3xx
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            registry,
            current: None,
            bearer: None,
            default_headers: Vec::new(),
            timeout,
        })
    }

    pub fn from_config(config: &SuiteConfig) -> Result<Self> {
        let registry = Arc::new(EndpointRegistry::from_config(config)?);
        Self::with_registry(config, registry)
    }

    /// 共用同一份 registry 建立新的 context（例如每個情境一個）
    pub fn with_registry(config: &SuiteConfig, registry: Arc<EndpointRegistry>) -> Result<Self> {
        let mut context = Self::new(registry, config.request_timeout(), &config.user_agent())?;
        let mut headers: Vec<_> = config.default_headers().into_iter().collect();
        headers.sort();
        context.default_headers = headers;
        Ok(context)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn add_default_header(&mut self, key: &str, value: &str) {
        self.default_headers.push((key.to_string(), value.to_string()));
    }

    pub fn switch_to(&mut self, service: ServiceKind) -> Result<()> {
        if !self.registry.contains(service) {
            return Err(E2eError::ServiceNotConfigured {
                service: service.to_string(),
            });
        }
        if self.current != Some(service) {
            tracing::debug!("🔀 Switching endpoint to {}", service);
        }
        self.current = Some(service);
        Ok(())
    }

    pub fn current_service(&self) -> Option<ServiceKind> {
        self.current
    }

    fn selected(&self) -> Result<ServiceKind> {
        self.current.ok_or(E2eError::NoServiceSelected)
    }

    /// 設定預設的 bearer token，之後所有請求都會帶上
    pub fn authenticate(&mut self, token: &str) {
        self.bearer = Some(token.to_string());
    }

    pub fn clear_auth(&mut self) {
        self.bearer = None;
    }

    /// 不改變目前選定服務的前提下，對指定服務發送請求
    pub fn on(&self, service: ServiceKind) -> ServiceClient<'_> {
        ServiceClient { ctx: self, service }
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let service = self.selected()?;
        self.dispatch(service, request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).form(fields.iter().copied())).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)).await
    }

    pub async fn put_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path).form(fields.iter().copied())).await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    /// 實際送出 HTTP 請求並收集回應
    pub async fn dispatch(&self, service: ServiceKind, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.registry.resolve(service, &request.path)?;
        let method = request.method.clone();

        let mut builder = self.client.request(method.clone(), url.clone());

        for (key, value) in &self.default_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = request.bearer.as_deref().or(self.bearer.as_deref()) {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(upload) => builder.multipart(upload.into_form()?),
        };

        tracing::debug!("📡 {} {} ({})", method, url, service);
        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response.text().await?;
        let json = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };

        tracing::debug!("📡 {} {} -> {}", method, final_url, status);
        if StatusCategory::from_status(status) == StatusCategory::ServerError {
            tracing::warn!("⚠️ {} {} returned {}", method, final_url, status);
        }

        Ok(ApiResponse {
            service,
            method,
            url: final_url,
            status,
            headers,
            body,
            json,
        })
    }
}

/// 綁定單一服務的輕量 handle
#[derive(Debug, Clone, Copy)]
pub struct ServiceClient<'a> {
    ctx: &'a ClientContext,
    service: ServiceKind,
}

impl ServiceClient<'_> {
    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.ctx.dispatch(self.service, request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).form(fields.iter().copied())).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            service: ServiceKind::Review,
            method: Method::GET,
            url: Url::parse("http://localhost/usr/reviews").unwrap(),
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.to_string(),
            json: serde_json::from_str(body).ok(),
        }
    }

    #[test]
    fn test_request_builder_collects_parts() {
        let request = ApiRequest::post("/reviews")
            .query("lang", "en")
            .header("X-Trace", "abc")
            .form([("value", "3"), ("int_xxid", "biz-1")])
            .bearer("token-1");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("lang".to_string(), "en".to_string())]);
        assert_eq!(request.bearer.as_deref(), Some("token-1"));
        match request.body {
            RequestBody::Form(fields) => assert_eq!(fields.len(), 2),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_response_field_lookup() {
        let resp = response(200, r#"{"reviews":[{"id":"r1","value":3}]}"#);
        assert_eq!(resp.field("reviews.0.value").unwrap(), &json!(3));
        assert_eq!(resp.str_field("reviews.0.id").unwrap(), "r1");
        assert!(resp.field("reviews.1.value").is_err());
    }

    #[test]
    fn test_expect_status_reports_context() {
        let resp = response(404, r#"{"error":"not found"}"#);
        match resp.expect_success() {
            Err(E2eError::UnexpectedStatus {
                service,
                actual,
                expected,
                ..
            }) => {
                assert_eq!(service, "review");
                assert_eq!(actual, 404);
                assert_eq!(expected, "success");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let resp = response(200, "<html>ok</html>");
        assert!(resp.json.is_none());
        assert!(matches!(resp.json(), Err(E2eError::InvalidJson { .. })));
        assert_eq!(resp.body, "<html>ok</html>");
    }

    #[test]
    fn test_dispatch_without_selection_fails() {
        let registry = EndpointRegistry::new()
            .with_endpoint(ServiceKind::Review, "http://localhost:1")
            .unwrap();
        let mut ctx =
            ClientContext::new(Arc::new(registry), Duration::from_secs(1), "test").unwrap();

        assert!(ctx.current_service().is_none());
        assert!(matches!(ctx.selected(), Err(E2eError::NoServiceSelected)));
        assert!(ctx.switch_to(ServiceKind::Media).is_err());
        // 切換失敗不改變目前選擇
        assert!(ctx.current_service().is_none());
        ctx.switch_to(ServiceKind::Review).unwrap();
        assert_eq!(ctx.current_service(), Some(ServiceKind::Review));
    }
}
