use clap::Parser;
use svc_e2e::core::report::ReportWriter;
use svc_e2e::fixtures::sweep_promos;
use svc_e2e::scenarios;
use svc_e2e::utils::error::ErrorSeverity;
use svc_e2e::utils::{logger, validation::Validate};
use svc_e2e::{ClientContext, CliConfig, E2eError, LocalStorage, ScenarioSuite, SuiteConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if cli.list {
        for scenario in scenarios::registry() {
            let services: Vec<String> = scenario
                .required_services()
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{:<26} requires: {}", scenario.name(), services.join(", "));
        }
        return Ok(());
    }

    tracing::info!("🚀 Starting svc-e2e");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let mut config = match SuiteConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let selected = match scenarios::select(&config.suite.scenarios) {
        Ok(selected) => selected,
        Err(e) => exit_with(&e),
    };

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be sent");
        println!("Suite: {}", config.suite.name);
        let services: Vec<String> = config
            .configured_services()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Services: {}", services.join(", "));
        for scenario in &selected {
            let status = if scenario.should_run(&config) { "run" } else { "skip" };
            println!("  - {} ({})", scenario.name(), status);
        }
        return Ok(());
    }

    if cli.sweep_promos {
        if let Err(e) = run_promo_sweep(&config).await {
            exit_with(&e);
        }
    }

    let execution_id = format!("{}-{}", config.suite.name, chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    let report_config = config.report.clone();

    let mut suite = match ScenarioSuite::new(execution_id, config) {
        Ok(suite) => suite.with_monitoring(cli.monitor),
        Err(e) => exit_with(&e),
    };
    for scenario in selected {
        suite.add_scenario(scenario);
    }

    let results = match suite.execute_all().await {
        Ok(results) => results,
        Err(e) => exit_with(&e),
    };

    for result in &results {
        let marker = match result.outcome.label() {
            "passed" => "✅",
            "failed" => "❌",
            _ => "⏭️",
        };
        println!(
            "{} {} ({:?}) {}",
            marker,
            result.scenario_name,
            result.duration,
            result.outcome.message()
        );
    }

    let summary = ScenarioSuite::get_execution_summary(&results);
    println!(
        "📈 Total: {} scenario(s), {} passed, {} failed, {} skipped",
        summary["total_scenarios"], summary["passed"], summary["failed"], summary["skipped"]
    );

    if let Some(report_config) = report_config {
        let writer = ReportWriter::new(LocalStorage::new(&report_config.output_path), &report_config);
        if let Err(e) = writer.write(suite.execution_id(), &results).await {
            tracing::error!("❌ Failed to write report: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
        }
    }

    if results.iter().any(|r| r.outcome.label() == "failed") {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_promo_sweep(config: &SuiteConfig) -> svc_e2e::Result<()> {
    let prefix = config.fixtures().promo_prefix();
    let token = config
        .auth
        .as_ref()
        .and_then(|auth| auth.moderator_token.clone())
        .ok_or_else(|| E2eError::MissingConfigError {
            field: "auth.moderator_token".to_string(),
        })?;

    let ctx = ClientContext::from_config(config)?;
    let report = sweep_promos(&ctx, &token, &prefix).await?;
    for failure in &report.failures {
        tracing::warn!("🧹 Could not delete promo: {}", failure);
    }
    Ok(())
}

fn exit_with(e: &E2eError) -> ! {
    tracing::error!(
        "❌ svc-e2e failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
