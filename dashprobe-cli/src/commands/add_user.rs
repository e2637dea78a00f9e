//! `dashprobe add-user` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use dashprobe_core::config::DashprobeConfig;
use dashprobe_dashboard::users::{create_user, password_from, random_username};
use dashprobe_model::JujuCliClient;

use crate::cli::AddUserArgs;
use crate::commands::model_error;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `add-user` command.
///
/// The generated password is part of the JSON payload only.
pub async fn execute(
    args: AddUserArgs,
    config: DashprobeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dashboard = &config.dashboard;
    let username = args
        .username
        .unwrap_or_else(|| random_username(&dashboard.username_prefix));
    let role = args.role.unwrap_or_else(|| dashboard.user_role.clone());

    let model = JujuCliClient::from_config(&config.model);
    let outcome = create_user(&model, &dashboard.application, &username, &role)
        .await
        .map_err(model_error)?;
    let password = password_from(&outcome, "add_user")?;
    info!(username = %username, unit = %outcome.unit, "dashboard user created");

    writer.render(&AddUserReport {
        username,
        role,
        unit: outcome.unit,
        password,
    })
}

/// Created user.
#[derive(Serialize)]
pub struct AddUserReport {
    pub username: String,
    pub role: String,
    /// Unit that ran the action.
    pub unit: String,
    pub password: String,
}

impl Render for AddUserReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "User {} created", self.username.bold())?;
        writeln!(w, "  Role:     {}", self.role)?;
        writeln!(w, "  Unit:     {}", self.unit)?;
        writeln!(w, "  Password: {}", "(use --output json to print)".dimmed())?;
        Ok(())
    }
}
