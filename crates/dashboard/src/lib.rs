#![doc = include_str!("../README.md")]

pub mod certs;
pub mod context;
pub mod error;
pub mod http;
pub mod keys;
pub mod login;
pub mod probe;
pub mod release;
pub mod saml;
pub mod suite;
pub mod users;

pub use certs::CaCertificate;
pub use context::{SuiteContext, unit_url};
pub use error::DashboardError;
pub use http::{DashboardHttp, RetryPolicy};
pub use probe::{Topology, find_active_endpoint, verify_topology};
pub use saml::SamlCheck;
pub use suite::{Outcome, Scenario, ScenarioReport, Suite, SuiteReport};
