use crate::config::suite_config::SuiteConfig;
use crate::utils::error::{E2eError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// 受測的遠端服務
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Listing,
    Review,
    Account,
    Media,
    Promotions,
    Profile,
    Notification,
}

impl ServiceKind {
    pub const ALL: &'static [ServiceKind] = &[
        ServiceKind::Listing,
        ServiceKind::Review,
        ServiceKind::Account,
        ServiceKind::Media,
        ServiceKind::Promotions,
        ServiceKind::Profile,
        ServiceKind::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Listing => "listing",
            ServiceKind::Review => "review",
            ServiceKind::Account => "account",
            ServiceKind::Media => "media",
            ServiceKind::Promotions => "promotions",
            ServiceKind::Profile => "profile",
            ServiceKind::Notification => "notification",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self> {
        ServiceKind::ALL
            .iter()
            .copied()
            .find(|service| service.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| E2eError::InvalidConfigValueError {
                field: "service".to_string(),
                value: s.to_string(),
                reason: "Unknown service name".to_string(),
            })
    }
}

/// 服務名稱到 base URL 的對照表
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<ServiceKind, Url>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SuiteConfig) -> Result<Self> {
        let mut registry = Self::new();
        for service in ServiceKind::ALL {
            if let Some(base_url) = config.service_url(*service) {
                registry.register(*service, base_url)?;
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, service: ServiceKind, base_url: &str) -> Result<()> {
        let url = Url::parse(base_url)?;
        tracing::debug!("🔗 Registered {} -> {}", service, url);
        self.endpoints.insert(service, url);
        Ok(())
    }

    pub fn with_endpoint(mut self, service: ServiceKind, base_url: &str) -> Result<Self> {
        self.register(service, base_url)?;
        Ok(self)
    }

    pub fn contains(&self, service: ServiceKind) -> bool {
        self.endpoints.contains_key(&service)
    }

    pub fn base_url(&self, service: ServiceKind) -> Result<&Url> {
        self.endpoints
            .get(&service)
            .ok_or_else(|| E2eError::ServiceNotConfigured {
                service: service.to_string(),
            })
    }

    /// 組合 base URL 與請求路徑，保留 base URL 既有的路徑前綴
    pub fn resolve(&self, service: ServiceKind, path: &str) -> Result<Url> {
        let base = self.base_url(service)?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind_parsing() {
        assert_eq!("review".parse::<ServiceKind>().unwrap(), ServiceKind::Review);
        assert_eq!(" Promotions ".parse::<ServiceKind>().unwrap(), ServiceKind::Promotions);
        assert!("billing".parse::<ServiceKind>().is_err());
        assert_eq!(ServiceKind::Media.to_string(), "media");
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let registry = EndpointRegistry::new()
            .with_endpoint(ServiceKind::Review, "https://api.example.com/ratings/v2/")
            .unwrap();

        let url = registry.resolve(ServiceKind::Review, "/usr/reviews").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/ratings/v2/usr/reviews");

        let url = registry.resolve(ServiceKind::Review, "reviews/12").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/ratings/v2/reviews/12");
    }

    #[test]
    fn test_unconfigured_service_is_an_error() {
        let registry = EndpointRegistry::new();
        match registry.resolve(ServiceKind::Media, "/images") {
            Err(E2eError::ServiceNotConfigured { service }) => assert_eq!(service, "media"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
