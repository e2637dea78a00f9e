//! Command handlers -- one module per subcommand

pub mod add_user;
pub mod config;
pub mod probe;
pub mod run;

use dashprobe_core::error::ModelError;
use dashprobe_dashboard::DashboardError;

use crate::error::CliError;

/// Maps failures to drive `juju` at all onto [`CliError::ModelUnavailable`].
pub(crate) fn model_error(e: DashboardError) -> CliError {
    match e {
        DashboardError::Model(err @ (ModelError::Spawn { .. } | ModelError::Timeout { .. })) => {
            CliError::ModelUnavailable(err.to_string())
        }
        other => other.into(),
    }
}
