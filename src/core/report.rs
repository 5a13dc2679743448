use crate::config::suite_config::ReportConfig;
use crate::core::suite::{ScenarioResult, ScenarioSuite};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde_json::json;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const SUMMARY_FILE: &str = "summary.json";
pub const RESULTS_FILE: &str = "results.csv";
pub const ARCHIVE_FILE: &str = "e2e_report.zip";

/// 將執行結果寫成 JSON / CSV，並可選擇打包成 zip
pub struct ReportWriter<S: Storage> {
    storage: S,
    formats: Vec<String>,
    archive: bool,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S, config: &ReportConfig) -> Self {
        Self {
            storage,
            formats: config.formats.clone(),
            archive: config.archive.unwrap_or(false),
        }
    }

    /// 回傳寫入的檔名
    pub async fn write(&self, execution_id: &str, results: &[ScenarioResult]) -> Result<Vec<String>> {
        let mut files: Vec<(&str, Vec<u8>)> = Vec::new();

        if self.formats.iter().any(|f| f == "json") {
            files.push((SUMMARY_FILE, render_json(execution_id, results)?));
        }
        if self.formats.iter().any(|f| f == "csv") {
            files.push((RESULTS_FILE, render_csv(results)?));
        }

        let mut written = Vec::new();
        for (name, data) in &files {
            self.storage.write_file(name, data).await?;
            written.push(name.to_string());
        }

        if self.archive && !files.is_empty() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file(*name, SimpleFileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };
            tracing::debug!("Writing report archive ({} bytes)", zip_data.len());
            self.storage.write_file(ARCHIVE_FILE, &zip_data).await?;
            written.push(ARCHIVE_FILE.to_string());
        }

        tracing::info!("📁 Report written: {}", written.join(", "));
        Ok(written)
    }
}

pub fn render_json(execution_id: &str, results: &[ScenarioResult]) -> Result<Vec<u8>> {
    let document = json!({
        "execution_id": execution_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "summary": ScenarioSuite::get_execution_summary(results),
        "results": results,
    });
    Ok(serde_json::to_vec_pretty(&document)?)
}

pub fn render_csv(results: &[ScenarioResult]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "scenario",
        "outcome",
        "duration_ms",
        "message",
        "teardown_deleted",
        "teardown_already_gone",
        "teardown_failures",
    ])?;

    for result in results {
        let (deleted, already_gone, failures) = result
            .teardown
            .as_ref()
            .map(|t| (t.deleted, t.already_gone, t.failures.len()))
            .unwrap_or_default();

        writer.write_record([
            result.scenario_name.clone(),
            result.outcome.label().to_string(),
            result.duration.as_millis().to_string(),
            result.outcome.message().to_string(),
            deleted.to_string(),
            already_gone.to_string(),
            failures.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::suite::ScenarioOutcome;
    use crate::fixtures::TeardownReport;
    use std::time::Duration;

    fn sample_results() -> Vec<ScenarioResult> {
        vec![
            ScenarioResult {
                scenario_name: "review_round_trip".to_string(),
                outcome: ScenarioOutcome::Passed,
                duration: Duration::from_millis(1200),
                teardown: Some(TeardownReport {
                    deleted: 2,
                    already_gone: 0,
                    failures: Vec::new(),
                }),
            },
            ScenarioResult {
                scenario_name: "image_linking".to_string(),
                outcome: ScenarioOutcome::Failed {
                    message: "image, missing".to_string(),
                },
                duration: Duration::from_millis(800),
                teardown: None,
            },
        ]
    }

    #[test]
    fn test_render_csv_quotes_messages() {
        let csv = String::from_utf8(render_csv(&sample_results()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("scenario,outcome,duration_ms"));
        assert_eq!(lines[1], "review_round_trip,passed,1200,,2,0,0");
        assert_eq!(lines[2], "image_linking,failed,800,\"image, missing\",0,0,0");
    }

    #[test]
    fn test_render_json_contains_summary() {
        let data = render_json("exec-9", &sample_results()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();

        assert_eq!(value["execution_id"], "exec-9");
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["results"][0]["outcome"]["status"], "passed");
        assert_eq!(value["results"][1]["duration_ms"], 800);
    }
}
