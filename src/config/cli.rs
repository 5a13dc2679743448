use crate::config::suite_config::{ReportConfig, SuiteConfig};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "svc-e2e")]
#[command(about = "End-to-end API checks across the listing, review, account, media and promotions services")]
pub struct CliConfig {
    /// Path to the suite TOML configuration
    #[arg(short, long, default_value = "e2e-suite.toml")]
    pub config: String,

    /// Run only these scenarios (comma separated), overriding suite.scenarios
    #[arg(short, long = "scenario", value_delimiter = ',')]
    pub scenarios: Vec<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log CPU and memory usage at suite start and end
    #[arg(long)]
    pub monitor: bool,

    /// Keep created fixtures instead of deleting them
    #[arg(long)]
    pub no_cleanup: bool,

    /// Override report.output_path
    #[arg(long)]
    pub output: Option<String>,

    /// Delete leftover promo codes matching fixtures.promo_code_prefix before running
    #[arg(long)]
    pub sweep_promos: bool,

    /// List the built-in scenarios and exit
    #[arg(long)]
    pub list: bool,

    /// Validate config and show what would run without sending requests
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 將命令列參數覆蓋到 suite 配置
    pub fn apply_overrides(&self, config: &mut SuiteConfig) {
        if !self.scenarios.is_empty() {
            config.suite.scenarios = self.scenarios.clone();
        }
        if self.no_cleanup {
            config.suite.cleanup = Some(false);
        }
        if let Some(output) = &self.output {
            match &mut config.report {
                Some(report) => report.output_path = output.clone(),
                None => {
                    config.report = Some(ReportConfig {
                        output_path: output.clone(),
                        formats: vec!["json".to_string(), "csv".to_string()],
                        archive: None,
                    })
                }
            }
        }
    }
}
