use crate::core::endpoint::ServiceKind;
use crate::utils::error::{E2eError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub suite: SuiteInfo,
    pub services: ServicesConfig,
    pub http: Option<HttpConfig>,
    pub auth: Option<AuthConfig>,
    pub fixtures: Option<FixtureConfig>,
    pub polling: Option<PollingConfig>,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    /// 執行順序；空白代表執行所有內建情境
    #[serde(default)]
    pub scenarios: Vec<String>,
    pub parallelism: Option<usize>,
    pub fail_fast: Option<bool>,
    pub cleanup: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub listing: Option<String>,
    pub review: Option<String>,
    pub account: Option<String>,
    pub media: Option<String>,
    pub promotions: Option<String>,
    pub profile: Option<String>,
    pub notification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub moderator_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureConfig {
    pub email_prefix: Option<String>,
    pub email_domain: Option<String>,
    pub password: Option<String>,
    pub business_id: Option<String>,
    pub search_what: Option<String>,
    pub search_where: Option<String>,
    pub promo_team: Option<String>,
    /// 情境建立的 promo code 前綴，也是 sweep 的比對條件
    pub promo_code_prefix: Option<String>,
}

impl FixtureConfig {
    pub fn promo_prefix(&self) -> String {
        self.promo_code_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMO_PREFIX.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub timeout_seconds: Option<u64>,
    pub interval_millis: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: String,
    #[serde(default = "default_report_formats")]
    pub formats: Vec<String>,
    pub archive: Option<bool>,
}

fn default_report_formats() -> Vec<String> {
    vec!["json".to_string()]
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_PROMO_PREFIX: &str = "E2E-";
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3_600;
const MAX_POLL_TIMEOUT_SECS: u64 = 86_400;

impl SuiteConfig {
    /// 從 TOML 檔案載入 suite 配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(E2eError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| E2eError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REVIEW_URL})；找不到的變數保留原樣，交給 validate 報錯
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            E2eError::ConfigValidationError {
                field: "env_substitution".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得某服務的 base URL
    pub fn service_url(&self, service: ServiceKind) -> Option<&str> {
        let services = &self.services;
        match service {
            ServiceKind::Listing => services.listing.as_deref(),
            ServiceKind::Review => services.review.as_deref(),
            ServiceKind::Account => services.account.as_deref(),
            ServiceKind::Media => services.media.as_deref(),
            ServiceKind::Promotions => services.promotions.as_deref(),
            ServiceKind::Profile => services.profile.as_deref(),
            ServiceKind::Notification => services.notification.as_deref(),
        }
    }

    pub fn configured_services(&self) -> Vec<ServiceKind> {
        ServiceKind::ALL
            .iter()
            .copied()
            .filter(|service| self.service_url(*service).is_some())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .http
            .as_ref()
            .and_then(|h| h.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn user_agent(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.user_agent.clone())
            .unwrap_or_else(|| format!("svc-e2e/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn default_headers(&self) -> HashMap<String, String> {
        self.http
            .as_ref()
            .and_then(|h| h.headers.clone())
            .unwrap_or_default()
    }

    pub fn poll_timeout(&self) -> Duration {
        let secs = self
            .polling
            .as_ref()
            .and_then(|p| p.timeout_seconds)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn poll_interval(&self) -> Duration {
        let millis = self
            .polling
            .as_ref()
            .and_then(|p| p.interval_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(millis)
    }

    pub fn parallelism(&self) -> usize {
        self.suite.parallelism.unwrap_or(1)
    }

    pub fn fail_fast(&self) -> bool {
        self.suite.fail_fast.unwrap_or(false)
    }

    pub fn cleanup_enabled(&self) -> bool {
        self.suite.cleanup.unwrap_or(true)
    }

    pub fn fixtures(&self) -> FixtureConfig {
        self.fixtures.clone().unwrap_or_default()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("suite.name", &self.suite.name)?;

        for service in ServiceKind::ALL {
            if let Some(url) = self.service_url(*service) {
                validation::validate_url(&format!("services.{}", service), url)?;
            }
        }

        if self.configured_services().is_empty() {
            return Err(E2eError::MissingConfigError {
                field: "services".to_string(),
            });
        }

        validation::validate_positive_number("suite.parallelism", self.parallelism(), 1)?;

        if self.fail_fast() && self.parallelism() > 1 {
            return Err(E2eError::ConfigValidationError {
                field: "suite.fail_fast".to_string(),
                message: "fail_fast requires parallelism = 1".to_string(),
            });
        }

        validation::validate_range(
            "http.timeout_seconds",
            self.request_timeout().as_secs(),
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        validation::validate_range(
            "polling.timeout_seconds",
            self.poll_timeout().as_secs(),
            1,
            MAX_POLL_TIMEOUT_SECS,
        )?;

        if self.poll_interval().is_zero() || self.poll_interval() >= self.poll_timeout() {
            return Err(E2eError::InvalidConfigValueError {
                field: "polling.interval_millis".to_string(),
                value: self.poll_interval().as_millis().to_string(),
                reason: "Interval must be non-zero and shorter than polling.timeout_seconds".to_string(),
            });
        }

        if let Some(auth) = &self.auth {
            validation::validate_non_empty_string("auth.client_id", &auth.client_id)?;
        }

        // 空前綴會讓 sweep 刪掉所有 promo
        if let Some(prefix) = self.fixtures.as_ref().and_then(|f| f.promo_code_prefix.as_deref()) {
            validation::validate_non_empty_string("fixtures.promo_code_prefix", prefix)?;
        }

        if let Some(report) = &self.report {
            validation::validate_path("report.output_path", &report.output_path)?;
            let valid_formats = ["json", "csv"];
            for format in &report.formats {
                if !valid_formats.contains(&format.as_str()) {
                    return Err(E2eError::InvalidConfigValueError {
                        field: "report.formats".to_string(),
                        value: format.clone(),
                        reason: format!(
                            "Unsupported format. Valid formats: {}",
                            valid_formats.join(", ")
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Validate for SuiteConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[suite]
name = "staging-smoke"
scenarios = ["review_round_trip"]

[services]
review = "https://reviews.example.com/api"
account = "https://accounts.example.com"

[auth]
client_id = "e2e"
client_secret = "secret"

[polling]
timeout_seconds = 5
interval_millis = 100
"#;

    #[test]
    fn test_parse_basic_suite_config() {
        let config = SuiteConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.suite.name, "staging-smoke");
        assert_eq!(config.suite.scenarios, vec!["review_round_trip"]);
        assert_eq!(
            config.service_url(ServiceKind::Review),
            Some("https://reviews.example.com/api")
        );
        assert!(config.service_url(ServiceKind::Media).is_none());
        assert_eq!(
            config.configured_services(),
            vec![ServiceKind::Review, ServiceKind::Account]
        );
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.cleanup_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SVC_E2E_TEST_LISTING_URL", "https://listing.test");

        let content = r#"
[suite]
name = "env"

[services]
listing = "${SVC_E2E_TEST_LISTING_URL}"
media = "${SVC_E2E_TEST_UNSET_URL}"
"#;

        let config = SuiteConfig::from_toml_str(content).unwrap();
        assert_eq!(config.services.listing.as_deref(), Some("https://listing.test"));
        assert_eq!(config.services.media.as_deref(), Some("${SVC_E2E_TEST_UNSET_URL}"));
        // 未設定的變數在驗證時報錯
        assert!(config.validate().is_err());

        std::env::remove_var("SVC_E2E_TEST_LISTING_URL");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let no_services = r#"
[suite]
name = "empty"

[services]
"#;
        let config = SuiteConfig::from_toml_str(no_services).unwrap();
        assert!(config.validate().is_err());

        let fail_fast_parallel = r#"
[suite]
name = "ff"
parallelism = 4
fail_fast = true

[services]
review = "http://localhost:1"
"#;
        let config = SuiteConfig::from_toml_str(fail_fast_parallel).unwrap();
        assert!(config.validate().is_err());

        let bad_format = r#"
[suite]
name = "fmt"

[services]
review = "http://localhost:1"

[report]
output_path = "./out"
formats = ["xml"]
"#;
        let config = SuiteConfig::from_toml_str(bad_format).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bounds_timeouts() {
        let huge_poll = r#"
[suite]
name = "poll"

[services]
review = "http://localhost:1"

[polling]
timeout_seconds = 9223372036854775807
"#;
        let config = SuiteConfig::from_toml_str(huge_poll).unwrap();
        assert!(matches!(
            config.validate(),
            Err(E2eError::InvalidConfigValueError { ref field, .. }) if field == "polling.timeout_seconds"
        ));

        let huge_http = r#"
[suite]
name = "http"

[services]
review = "http://localhost:1"

[http]
timeout_seconds = 9223372036854775807
"#;
        let config = SuiteConfig::from_toml_str(huge_http).unwrap();
        assert!(matches!(
            config.validate(),
            Err(E2eError::InvalidConfigValueError { ref field, .. }) if field == "http.timeout_seconds"
        ));
    }

    #[test]
    fn test_promo_prefix_default_and_empty_rejected() {
        let config = SuiteConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(config.fixtures().promo_prefix(), "E2E-");

        let empty_prefix = r#"
[suite]
name = "sweep"

[services]
promotions = "http://localhost:1"

[fixtures]
promo_code_prefix = "  "
"#;
        let config = SuiteConfig::from_toml_str(empty_prefix).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = SuiteConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.suite.name, "staging-smoke");
    }
}
