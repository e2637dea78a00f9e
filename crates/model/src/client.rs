//! Orchestration model abstraction for testability.
//!
//! The [`ModelClient`] trait abstracts the deployment orchestration layer,
//! allowing production code to use [`JujuCliClient`](crate::JujuCliClient)
//! while tests use `MockModelClient` (behind the `mock` feature).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Dashboard suite │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ ModelClient │ (trait)
//!   └─────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌──────┐
//!   │JujuCli│ │ Mock │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   juju controller
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use dashprobe_core::error::ModelError;
use dashprobe_core::types::{ActionOutcome, CommandOutcome};

/// Trait abstracting orchestration model operations.
///
/// Every call the dashboard scenarios make against the deployment goes
/// through this trait. The trait is `Send + Sync + 'static`, so a client can
/// be shared behind an `Arc`.
///
/// # Implementations
///
/// - [`JujuCliClient`](crate::JujuCliClient): drives the `juju` CLI
/// - `MockModelClient`: canned responses and recorded calls (`mock` feature)
///
/// # Error Handling
///
/// - Unknown applications: `ModelError::ApplicationNotFound`
/// - Unknown units or units without an address: `ModelError::UnitNotFound`
/// - CLI failures: `ModelError::CommandFailed` / `ModelError::Spawn`
/// - A failed action is NOT an error: it comes back as an [`ActionOutcome`]
///   with `ActionStatus::Failed`
pub trait ModelClient: Send + Sync + 'static {
    /// Lists the units of an application, ordered by unit number.
    fn units(
        &self,
        application: &str,
    ) -> impl Future<Output = Result<Vec<String>, ModelError>> + Send;

    /// Looks up the public address of a unit.
    ///
    /// Not cached: each call queries the model.
    fn unit_public_address(
        &self,
        unit: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;

    /// Runs an action on the application's leader unit and waits for it.
    fn run_action_on_leader(
        &self,
        application: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<ActionOutcome, ModelError>> + Send;

    /// Runs a shell command on the application's leader unit.
    ///
    /// A non-zero exit code is returned in [`CommandOutcome::code`], not as an error.
    fn run_on_leader(
        &self,
        application: &str,
        command: &str,
    ) -> impl Future<Output = Result<CommandOutcome, ModelError>> + Send;

    /// Names of all applications deployed in the model.
    fn application_names(&self) -> impl Future<Output = Result<Vec<String>, ModelError>> + Send;

    /// Current config values of an application (option name -> value).
    fn application_config(
        &self,
        application: &str,
    ) -> impl Future<Output = Result<BTreeMap<String, serde_json::Value>, ModelError>> + Send;

    /// Sets config options on an application.
    fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<(), ModelError>> + Send;

    /// Ubuntu series the application is deployed on (e.g. `jammy`).
    fn application_series(
        &self,
        application: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;

    /// Copies a file from a unit to a local path.
    fn scp_from_unit(
        &self,
        unit: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> impl Future<Output = Result<(), ModelError>> + Send;
}
