use crate::config::suite_config::{FixtureConfig, SuiteConfig};
use crate::core::client::ClientContext;
use crate::core::endpoint::EndpointRegistry;
use crate::core::poll::Poller;
use crate::domain::model::TestUser;
use crate::domain::ports::Scenario;
use crate::fixtures::{FixtureKind, FixtureTracker, TeardownReport, UserFactory};
use crate::utils::error::{E2eError, Result};
use crate::utils::monitor::RunMonitor;
use futures::FutureExt;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 單一情境的執行環境；每個情境各自擁有，不與其他情境共用
pub struct ScenarioEnv {
    pub ctx: ClientContext,
    pub users: UserFactory,
    pub fixtures: FixtureTracker,
    pub poller: Poller,
    pub config: Arc<SuiteConfig>,
}

impl ScenarioEnv {
    pub fn new(config: Arc<SuiteConfig>, registry: Arc<EndpointRegistry>) -> Result<Self> {
        Ok(Self {
            ctx: ClientContext::with_registry(&config, registry)?,
            users: UserFactory::from_config(&config),
            fixtures: FixtureTracker::new(),
            poller: Poller::from_config(&config),
            config,
        })
    }

    /// 建立使用者並登記清理
    pub async fn new_user(&mut self) -> Result<TestUser> {
        let user = self.users.create_user(&self.ctx).await?;
        self.fixtures
            .track(FixtureKind::User, &user.id, user.access_token());
        Ok(user)
    }

    /// 建立已加入 promo 的使用者並登記清理
    pub async fn new_enrolled_user(&mut self, promo_code: &str) -> Result<TestUser> {
        let user = self.users.create_enrolled_user(&self.ctx, promo_code).await?;
        self.fixtures
            .track(FixtureKind::User, &user.id, user.access_token());
        Ok(user)
    }

    pub fn fixture_config(&self) -> FixtureConfig {
        self.config.fixtures()
    }

    pub fn moderator_token(&self) -> Result<String> {
        self.config
            .auth
            .as_ref()
            .and_then(|auth| auth.moderator_token.clone())
            .ok_or_else(|| E2eError::MissingConfigError {
                field: "auth.moderator_token".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
}

impl ScenarioOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutcome::Passed => "passed",
            ScenarioOutcome::Failed { .. } => "failed",
            ScenarioOutcome::Skipped { .. } => "skipped",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScenarioOutcome::Passed => "",
            ScenarioOutcome::Failed { message } => message,
            ScenarioOutcome::Skipped { reason } => reason,
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// 情境執行結果
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub outcome: ScenarioOutcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub teardown: Option<TeardownReport>,
}

impl ScenarioResult {
    fn skipped(name: &str, reason: String) -> Self {
        Self {
            scenario_name: name.to_string(),
            outcome: ScenarioOutcome::Skipped { reason },
            duration: Duration::ZERO,
            teardown: None,
        }
    }

    fn failed(name: &str, message: String, duration: Duration) -> Self {
        Self {
            scenario_name: name.to_string(),
            outcome: ScenarioOutcome::Failed { message },
            duration,
            teardown: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == ScenarioOutcome::Passed
    }
}

/// 情境序列，依序（或有限度平行）執行並在每個情境後清理 fixture
pub struct ScenarioSuite {
    scenarios: Vec<Arc<dyn Scenario>>,
    config: Arc<SuiteConfig>,
    registry: Arc<EndpointRegistry>,
    monitor: Option<RunMonitor>,
    cleanup: bool,
    execution_id: String,
}

impl ScenarioSuite {
    pub fn new(execution_id: String, config: SuiteConfig) -> Result<Self> {
        let registry = Arc::new(EndpointRegistry::from_config(&config)?);
        let cleanup = config.cleanup_enabled();
        Ok(Self {
            scenarios: Vec::new(),
            config: Arc::new(config),
            registry,
            monitor: None,
            cleanup,
            execution_id,
        })
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled.then(|| RunMonitor::new(true));
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn add_scenario(&mut self, scenario: Arc<dyn Scenario>) {
        self.scenarios.push(scenario);
    }

    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// 執行所有情境；情境失敗記錄在結果中，不會讓整體回傳 Err
    pub async fn execute_all(&self) -> Result<Vec<ScenarioResult>> {
        tracing::info!(
            "🚀 Suite '{}' ({}) starting {} scenario(s)",
            self.config.suite.name,
            self.execution_id,
            self.scenarios.len()
        );
        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Suite started");
        }

        let results = if self.config.parallelism() > 1 {
            self.execute_parallel().await
        } else {
            self.execute_sequential().await
        };

        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Suite completed");
        }

        let failed = results.iter().filter(|r| matches!(r.outcome, ScenarioOutcome::Failed { .. })).count();
        tracing::info!(
            "🏁 Suite '{}' finished: {} scenario(s), {} failed",
            self.config.suite.name,
            results.len(),
            failed
        );

        Ok(results)
    }

    async fn execute_sequential(&self) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(self.scenarios.len());
        let mut failed_at: Option<String> = None;

        for scenario in &self.scenarios {
            if let Some(failed) = &failed_at {
                results.push(ScenarioResult::skipped(
                    scenario.name(),
                    format!("fail_fast after '{}'", failed),
                ));
                continue;
            }

            let result = Self::execute_scenario(
                scenario.clone(),
                self.config.clone(),
                self.registry.clone(),
                self.cleanup,
            )
            .await;

            if self.config.fail_fast() && matches!(result.outcome, ScenarioOutcome::Failed { .. }) {
                failed_at = Some(result.scenario_name.clone());
            }
            results.push(result);
        }

        results
    }

    async fn execute_parallel(&self) -> Vec<ScenarioResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism()));
        let mut tasks = JoinSet::new();

        for (index, scenario) in self.scenarios.iter().enumerate() {
            let semaphore = semaphore.clone();
            let scenario = scenario.clone();
            let config = self.config.clone();
            let registry = self.registry.clone();
            let cleanup = self.cleanup;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, Self::execute_scenario(scenario, config, registry, cleanup).await)
            });
        }

        // 單一 task 失敗不中止其餘 task
        let mut slots: Vec<Option<ScenarioResult>> = vec![None; self.scenarios.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("❌ Scenario task aborted: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(&self.scenarios)
            .map(|(slot, scenario)| {
                slot.unwrap_or_else(|| {
                    ScenarioResult::failed(scenario.name(), "scenario task aborted".to_string(), Duration::ZERO)
                })
            })
            .collect()
    }

    /// 執行單一情境：建立獨立環境、執行、清理
    async fn execute_scenario(
        scenario: Arc<dyn Scenario>,
        config: Arc<SuiteConfig>,
        registry: Arc<EndpointRegistry>,
        cleanup: bool,
    ) -> ScenarioResult {
        let name = scenario.name().to_string();

        if !scenario.should_run(&config) {
            let missing: Vec<String> = scenario
                .missing_services(&config)
                .iter()
                .map(ToString::to_string)
                .collect();
            tracing::info!("⏭️ Skipping scenario: {} (missing services: {})", name, missing.join(", "));
            return ScenarioResult::skipped(
                &name,
                format!("missing services: {}", missing.join(", ")),
            );
        }

        let start_time = Instant::now();
        let mut env = match ScenarioEnv::new(config, registry) {
            Ok(env) => env,
            Err(e) => return ScenarioResult::failed(&name, e.to_string(), start_time.elapsed()),
        };

        tracing::info!("▶️ Running scenario: {}", name);
        // panic 也要走到清理
        let outcome = match AssertUnwindSafe(scenario.run(&mut env)).catch_unwind().await {
            Ok(Ok(())) => ScenarioOutcome::Passed,
            Ok(Err(e)) => {
                tracing::error!("❌ Scenario {} failed: {}", name, e);
                tracing::error!("💡 {}", e.recovery_suggestion());
                ScenarioOutcome::Failed { message: e.to_string() }
            }
            Err(payload) => {
                let message = format!("scenario panicked: {}", panic_message(payload.as_ref()));
                tracing::error!("💥 Scenario {} {}", name, message);
                ScenarioOutcome::Failed { message }
            }
        };
        let duration = start_time.elapsed();

        // 無論成功與否都清理
        let teardown = if cleanup && !env.fixtures.is_empty() {
            Some(env.fixtures.teardown(&env.ctx).await)
        } else {
            None
        };

        if outcome == ScenarioOutcome::Passed {
            tracing::info!("✅ Scenario passed: {} ({:?})", name, duration);
        }

        ScenarioResult {
            scenario_name: name,
            outcome,
            duration,
            teardown,
        }
    }

    /// 獲取執行摘要
    pub fn get_execution_summary(results: &[ScenarioResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let count = |label: &str| results.iter().filter(|r| r.outcome.label() == label).count();
        let total_duration: Duration = results.iter().map(|r| r.duration).sum();
        let teardown_failures: usize = results
            .iter()
            .filter_map(|r| r.teardown.as_ref())
            .map(|t| t.failures.len())
            .sum();

        summary.insert("total_scenarios".to_string(), results.len().into());
        summary.insert("passed".to_string(), count("passed").into());
        summary.insert("failed".to_string(), count("failed").into());
        summary.insert("skipped".to_string(), count("skipped").into());
        summary.insert("teardown_failures".to_string(), teardown_failures.into());
        summary.insert(
            "total_duration_ms".to_string(),
            (total_duration.as_millis() as u64).into(),
        );

        let names = |label: &str| -> serde_json::Value {
            results
                .iter()
                .filter(|r| r.outcome.label() == label)
                .map(|r| serde_json::Value::String(r.scenario_name.clone()))
                .collect::<Vec<_>>()
                .into()
        };
        summary.insert("executed_scenarios".to_string(), {
            results
                .iter()
                .filter(|r| r.outcome.label() != "skipped")
                .map(|r| serde_json::Value::String(r.scenario_name.clone()))
                .collect::<Vec<_>>()
                .into()
        });
        summary.insert("failed_scenarios".to_string(), names("failed"));

        summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::endpoint::ServiceKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockScenario {
        name: String,
        fail: bool,
        panics: bool,
        services: Vec<ServiceKind>,
        runs: Arc<AtomicUsize>,
    }

    impl MockScenario {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                fail: false,
                panics: false,
                services: Vec::new(),
                runs: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn panicking(mut self) -> Self {
            self.panics = true;
            self
        }

        fn requiring(mut self, service: ServiceKind) -> Self {
            self.services.push(service);
            self
        }
    }

    #[async_trait]
    impl Scenario for MockScenario {
        fn name(&self) -> &str {
            &self.name
        }

        fn required_services(&self) -> &[ServiceKind] {
            &self.services
        }

        async fn run(&self, env: &mut ScenarioEnv) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            // 每個情境都拿到全新的 context
            assert!(env.ctx.current_service().is_none());
            env.ctx.switch_to(ServiceKind::Review)?;
            if self.panics {
                panic!("{} blew up", self.name);
            }
            if self.fail {
                Err(E2eError::AssertionFailed {
                    message: "expected failure".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn config(extra: &str) -> SuiteConfig {
        SuiteConfig::from_toml_str(&format!(
            r#"
[suite]
name = "unit"
cleanup = false
{}

[services]
review = "http://localhost:1"
"#,
            extra
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sequential_execution_and_skips() {
        let mut suite = ScenarioSuite::new("exec-1".to_string(), config("")).unwrap();
        suite.add_scenario(Arc::new(MockScenario::new("first")));
        suite.add_scenario(Arc::new(MockScenario::new("needs_media").requiring(ServiceKind::Media)));
        suite.add_scenario(Arc::new(MockScenario::new("broken").failing()));
        suite.add_scenario(Arc::new(MockScenario::new("last")));

        let results = suite.execute_all().await.unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].passed());
        assert_eq!(results[1].outcome.label(), "skipped");
        assert!(results[1].outcome.message().contains("media"));
        assert_eq!(results[2].outcome.label(), "failed");
        assert!(results[3].passed());
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining() {
        let last = MockScenario::new("last");
        let last_runs = last.runs.clone();

        let mut suite = ScenarioSuite::new("exec-2".to_string(), config("fail_fast = true")).unwrap();
        suite.add_scenario(Arc::new(MockScenario::new("broken").failing()));
        suite.add_scenario(Arc::new(last));

        let results = suite.execute_all().await.unwrap();

        assert_eq!(results[0].outcome.label(), "failed");
        assert_eq!(results[1].outcome.label(), "skipped");
        assert!(results[1].outcome.message().contains("broken"));
        assert_eq!(last_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parallel_execution_keeps_order() {
        let mut suite = ScenarioSuite::new("exec-3".to_string(), config("parallelism = 3")).unwrap();
        for i in 0..6 {
            suite.add_scenario(Arc::new(MockScenario::new(&format!("scenario_{}", i))));
        }

        let results = suite.execute_all().await.unwrap();

        let names: Vec<_> = results.iter().map(|r| r.scenario_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["scenario_0", "scenario_1", "scenario_2", "scenario_3", "scenario_4", "scenario_5"]
        );
        assert!(results.iter().all(|r| r.passed()));
    }

    #[tokio::test]
    async fn test_sequential_panic_becomes_failure() {
        let last = MockScenario::new("last");
        let last_runs = last.runs.clone();

        let mut suite = ScenarioSuite::new("exec-4".to_string(), config("")).unwrap();
        suite.add_scenario(Arc::new(MockScenario::new("exploding").panicking()));
        suite.add_scenario(Arc::new(last));

        let results = suite.execute_all().await.unwrap();

        assert_eq!(results[0].outcome.label(), "failed");
        assert!(results[0].outcome.message().contains("exploding blew up"));
        assert!(results[1].passed());
        assert_eq!(last_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_panic_does_not_abort_siblings() {
        let mut suite = ScenarioSuite::new("exec-5".to_string(), config("parallelism = 2")).unwrap();
        suite.add_scenario(Arc::new(MockScenario::new("sibling_a")));
        suite.add_scenario(Arc::new(MockScenario::new("exploding").panicking()));
        suite.add_scenario(Arc::new(MockScenario::new("sibling_b")));

        let results = suite.execute_all().await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].passed());
        assert_eq!(results[1].scenario_name, "exploding");
        assert!(results[1].outcome.message().contains("panicked"));
        assert!(results[2].passed());
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42u8), "non-string panic payload");
    }

    #[test]
    fn test_execution_summary() {
        let results = vec![
            ScenarioResult {
                scenario_name: "a".to_string(),
                outcome: ScenarioOutcome::Passed,
                duration: Duration::from_millis(100),
                teardown: Some(TeardownReport::default()),
            },
            ScenarioResult {
                scenario_name: "b".to_string(),
                outcome: ScenarioOutcome::Failed {
                    message: "boom".to_string(),
                },
                duration: Duration::from_millis(200),
                teardown: Some(TeardownReport {
                    deleted: 0,
                    already_gone: 0,
                    failures: vec!["review 1: HTTP 500".to_string()],
                }),
            },
            ScenarioResult::skipped("c", "missing services: media".to_string()),
        ];

        let summary = ScenarioSuite::get_execution_summary(&results);

        assert_eq!(summary["total_scenarios"], serde_json::json!(3));
        assert_eq!(summary["passed"], serde_json::json!(1));
        assert_eq!(summary["failed"], serde_json::json!(1));
        assert_eq!(summary["skipped"], serde_json::json!(1));
        assert_eq!(summary["teardown_failures"], serde_json::json!(1));
        assert_eq!(summary["total_duration_ms"], serde_json::json!(300));
        assert_eq!(summary["executed_scenarios"], serde_json::json!(["a", "b"]));
        assert_eq!(summary["failed_scenarios"], serde_json::json!(["b"]));
    }
}
