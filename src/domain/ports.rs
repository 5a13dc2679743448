use crate::config::suite_config::SuiteConfig;
use crate::core::endpoint::ServiceKind;
use crate::core::suite::ScenarioEnv;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 一個端到端測試情境
#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    /// 情境需要的服務；未設定時整個情境會被略過
    fn required_services(&self) -> &[ServiceKind] {
        &[]
    }

    fn should_run(&self, config: &SuiteConfig) -> bool {
        self.missing_services(config).is_empty()
    }

    fn missing_services(&self, config: &SuiteConfig) -> Vec<ServiceKind> {
        self.required_services()
            .iter()
            .copied()
            .filter(|service| config.service_url(*service).is_none())
            .collect()
    }

    async fn run(&self, env: &mut ScenarioEnv) -> Result<()>;
}
