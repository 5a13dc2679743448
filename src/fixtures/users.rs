use crate::config::suite_config::{AuthConfig, SuiteConfig};
use crate::core::client::ClientContext;
use crate::domain::model::{OAuthToken, TestUser};
use crate::services::{account, promotions};
use crate::utils::error::{E2eError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_EMAIL_PREFIX: &str = "e2e";
const DEFAULT_EMAIL_DOMAIN: &str = "example.test";
const DEFAULT_PASSWORD: &str = "E2e-Passw0rd!";

// 同一毫秒內建立多個使用者時避免 email 重複
static USER_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_counter() -> u64 {
    USER_COUNTER.fetch_add(1, Ordering::Relaxed)
}

fn unique_suffix_for(counter: u64) -> String {
    format!("{}{:04}", chrono::Utc::now().format("%Y%m%d%H%M%S%3f"), counter)
}

/// 每次呼叫都不同的 `{timestamp}{counter}` 字串，用於 fixture 命名
pub fn unique_suffix() -> String {
    unique_suffix_for(next_counter())
}

/// 建立並登入臨時使用者
#[derive(Debug, Clone)]
pub struct UserFactory {
    auth: Option<AuthConfig>,
    email_prefix: String,
    email_domain: String,
    password: String,
}

impl UserFactory {
    pub fn new(auth: Option<AuthConfig>) -> Self {
        Self {
            auth,
            email_prefix: DEFAULT_EMAIL_PREFIX.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }

    pub fn from_config(config: &SuiteConfig) -> Self {
        let fixtures = config.fixtures();
        let mut factory = Self::new(config.auth.clone());
        if let Some(prefix) = fixtures.email_prefix {
            factory.email_prefix = prefix;
        }
        if let Some(domain) = fixtures.email_domain {
            factory.email_domain = domain;
        }
        if let Some(password) = fixtures.password {
            factory.password = password;
        }
        factory
    }

    fn auth(&self) -> Result<&AuthConfig> {
        self.auth.as_ref().ok_or_else(|| E2eError::MissingConfigError {
            field: "auth".to_string(),
        })
    }

    /// 產生不重複的 email：`{prefix}+{timestamp}{counter}@{domain}`
    pub fn next_email(&self) -> String {
        self.email_for(next_counter())
    }

    fn email_for(&self, counter: u64) -> String {
        format!("{}+{}@{}", self.email_prefix, unique_suffix_for(counter), self.email_domain)
    }

    // email 與 last_name 共用同一個計數值
    fn next_registration(&self) -> account::Registration {
        let counter = next_counter();
        account::Registration {
            email: self.email_for(counter),
            password: self.password.clone(),
            first_name: "E2E".to_string(),
            last_name: format!("User{}", counter),
        }
    }

    /// 註冊並登入；任何一步失敗都以 FixtureError 中止情境
    pub async fn create_user(&self, ctx: &ClientContext) -> Result<TestUser> {
        let auth = self.auth().map_err(|e| e.in_fixture("auth"))?;
        let registration = self.next_registration();

        let id = account::register(ctx, &registration)
            .await
            .map_err(|e| e.in_fixture("register"))?;

        let token = account::request_token(ctx, auth, &registration.email, &registration.password)
            .await
            .map_err(|e| e.in_fixture("login"))?;

        tracing::info!("👤 Created fixture user {} ({})", registration.email, id);

        Ok(TestUser {
            id,
            email: registration.email,
            password: registration.password,
            first_name: registration.first_name,
            last_name: registration.last_name,
            token,
        })
    }

    pub async fn login(&self, ctx: &ClientContext, email: &str, password: &str) -> Result<OAuthToken> {
        account::request_token(ctx, self.auth()?, email, password).await
    }

    /// 以 refresh token 換新的 access token；沒有 refresh token 時重新登入
    pub async fn refresh(&self, ctx: &ClientContext, user: &mut TestUser) -> Result<()> {
        let token = match user.token.refresh_token.as_deref() {
            Some(refresh) => account::refresh_token(ctx, self.auth()?, refresh).await?,
            None => self.login(ctx, &user.email, &user.password).await?,
        };
        user.token = token;
        Ok(())
    }

    pub async fn create_enrolled_user(&self, ctx: &ClientContext, promo_code: &str) -> Result<TestUser> {
        let user = self.create_user(ctx).await?;
        promotions::enroll(ctx, user.access_token(), promo_code)
            .await
            .map_err(|e| e.in_fixture("promo_enroll"))?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_email_is_unique() {
        let factory = UserFactory::new(None);
        let first = factory.next_email();
        let second = factory.next_email();

        assert_ne!(first, second);
        assert!(first.starts_with("e2e+"));
        assert!(first.ends_with("@example.test"));
    }

    #[test]
    fn test_registration_uses_one_counter_value() {
        let factory = UserFactory::new(None);
        // 其他測試可能同時推進計數器
        let _ = factory.next_email();

        let registration = factory.next_registration();
        let counter = registration.last_name.trim_start_matches("User");

        assert!(counter.parse::<u64>().is_ok());
        assert!(registration.email.ends_with(&format!("{:04}@example.test", counter.parse::<u64>().unwrap())));
        assert_eq!(registration.first_name, "E2E");
    }

    #[test]
    fn test_unique_suffix_differs() {
        assert_ne!(unique_suffix(), unique_suffix());
    }

    #[test]
    fn test_from_config_overrides_defaults() {
        let config = SuiteConfig::from_toml_str(
            r#"
[suite]
name = "users"

[services]
account = "http://localhost:1"

[fixtures]
email_prefix = "qa"
email_domain = "qa.test"
"#,
        )
        .unwrap();

        let factory = UserFactory::from_config(&config);
        let email = factory.next_email();
        assert!(email.starts_with("qa+"));
        assert!(email.ends_with("@qa.test"));
        assert!(factory.auth().is_err());
    }
}
