//! `dashprobe run` command handler

use std::io::Write;

use tracing::info;

use dashprobe_core::config::DashprobeConfig;
use dashprobe_dashboard::{Outcome, Scenario, Suite, SuiteReport};
use dashprobe_model::JujuCliClient;

use crate::cli::RunArgs;
use crate::commands::model_error;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Scenario names are checked before the model is touched. The report is
/// always rendered; a failed scenario then turns into
/// [`CliError::ScenarioFailed`].
pub async fn execute(
    args: RunArgs,
    config: DashprobeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scenarios = Scenario::select(args.only.as_slice())?;
    info!(
        application = %config.dashboard.application,
        scenarios = scenarios.len(),
        "running dashboard scenarios"
    );

    let model = JujuCliClient::from_config(&config.model);
    let suite = Suite::new(model, config).await.map_err(model_error)?;
    let report = suite.run(args.only.as_slice()).await?;

    writer.render(&report)?;

    if !report.is_success() {
        return Err(CliError::ScenarioFailed {
            failed: report.failed,
        });
    }
    Ok(())
}

impl Render for SuiteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{}", "Scenarios".bold())?;
        for scenario in &self.scenarios {
            let (label, detail) = match &scenario.outcome {
                Outcome::Passed => ("PASS".green().bold(), None),
                Outcome::Skipped { reason } => ("SKIP".yellow().bold(), Some(reason)),
                Outcome::Failed { message } => ("FAIL".red().bold(), Some(message)),
            };
            writeln!(
                w,
                "  {}  {} ({} ms)",
                label, scenario.name, scenario.duration_ms
            )?;
            if let Some(detail) = detail {
                writeln!(w, "        {}", detail)?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Summary: {} passed, {} failed, {} skipped",
            self.passed.to_string().green(),
            self.failed.to_string().red(),
            self.skipped.to_string().yellow()
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashprobe_dashboard::ScenarioReport;

    fn report() -> SuiteReport {
        SuiteReport {
            scenarios: vec![
                ScenarioReport {
                    name: "dashboard_units".to_owned(),
                    outcome: Outcome::Passed,
                    duration_ms: 12,
                },
                ScenarioReport {
                    name: "access_dashboard".to_owned(),
                    outcome: Outcome::Failed {
                        message: "expected 201 Created, got 401".to_owned(),
                    },
                    duration_ms: 3,
                },
                ScenarioReport {
                    name: "saml".to_owned(),
                    outcome: Outcome::Skipped {
                        reason: "release focal_xena is older than focal_yoga".to_owned(),
                    },
                    duration_ms: 0,
                },
            ],
            passed: 1,
            failed: 1,
            skipped: 1,
        }
    }

    #[test]
    fn test_suite_report_render_text() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report()
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("PASS  dashboard_units (12 ms)"));
        assert!(output.contains("FAIL  access_dashboard (3 ms)"));
        assert!(output.contains("expected 201 Created, got 401"));
        assert!(output.contains("SKIP  saml (0 ms)"));
        assert!(output.contains("Summary: 1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_suite_report_json_serialization() {
        let json = serde_json::to_value(report()).expect("JSON serialization should succeed");
        assert_eq!(json["failed"].as_u64(), Some(1));
        assert_eq!(json["scenarios"][0]["outcome"]["status"], "passed");
        assert_eq!(json["scenarios"][1]["outcome"]["status"], "failed");
        assert_eq!(
            json["scenarios"][2]["outcome"]["reason"],
            "release focal_xena is older than focal_yoga"
        );
    }
}
