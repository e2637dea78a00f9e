//! `dashprobe probe` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use dashprobe_core::config::DashprobeConfig;
use dashprobe_dashboard::probe::probe_units;
use dashprobe_dashboard::{SuiteContext, Topology};
use dashprobe_model::{JujuCliClient, ModelClient};

use crate::commands::model_error;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `probe` command.
///
/// Every unit is probed once. The report is rendered before an unhealthy
/// topology is reported as an error.
pub async fn execute(config: DashprobeConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let model = JujuCliClient::from_config(&config.model);
    let ctx = SuiteContext::build(model, config)
        .await
        .map_err(model_error)?;
    let topology = probe_units(&ctx).await.map_err(model_error)?;

    let report = ProbeReport::new(&ctx, topology);
    info!(
        application = %report.application,
        healthy = report.healthy,
        "probe finished"
    );
    writer.render(&report)?;

    match report.topology.verify() {
        Ok(()) => Ok(()),
        Err(reason) => Err(CliError::Command(format!(
            "dashboard topology is unhealthy: {reason}"
        ))),
    }
}

/// Per-status view of the dashboard units.
#[derive(Serialize)]
pub struct ProbeReport {
    pub application: String,
    /// Base URL of the first unit that answered 200.
    pub active: Option<String>,
    pub healthy: bool,
    pub topology: Topology,
}

impl ProbeReport {
    fn new<M: ModelClient>(ctx: &SuiteContext<M>, topology: Topology) -> Self {
        let active = topology
            .addresses(200)
            .first()
            .map(|address| ctx.unit_url(address));
        Self {
            application: ctx.application().to_owned(),
            active,
            healthy: topology.is_healthy(),
            topology,
        }
    }
}

impl Render for ProbeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Dashboard: {}", self.application.bold())?;
        match &self.active {
            Some(url) => writeln!(w, "  Active:   {}", url.green())?,
            None => writeln!(w, "  Active:   {}", "none".red())?,
        }
        let health = if self.healthy {
            "HEALTHY".green().bold()
        } else {
            "UNHEALTHY".red().bold()
        };
        writeln!(w, "  Topology: {} {}", self.topology, health)?;
        writeln!(w, "  Units:    {}", self.topology.unit_count)?;
        Ok(())
    }
}
