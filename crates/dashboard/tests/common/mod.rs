//! Shared fixtures for the dashboard integration tests.
//!
//! Dashboard units share one port, so each fake unit is a wiremock server
//! bound to its own loopback address (`127.0.0.1`, `127.0.0.2`, ...) on the
//! same port.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::net::TcpListener;
use std::sync::Mutex;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashprobe_core::config::DashprobeConfig;
use dashprobe_core::types::{ActionOutcome, ActionStatus, CommandOutcome};
use dashprobe_dashboard::{CaCertificate, DashboardHttp, RetryPolicy, SuiteContext};
use dashprobe_model::MockModelClient;

pub const APP: &str = "ceph-dashboard";

pub const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBdashprobetest\n-----END CERTIFICATE-----\n";

/// Fake dashboard units on consecutive loopback addresses.
pub struct Units {
    pub servers: Vec<MockServer>,
    pub addresses: Vec<String>,
    pub port: u16,
}

impl Units {
    /// Starts `count` servers sharing one port.
    pub async fn start(count: usize) -> Self {
        for _ in 0..20 {
            if let Some(units) = Self::try_start(count).await {
                return units;
            }
        }
        panic!("could not bind {count} loopback addresses on a shared port");
    }

    async fn try_start(count: usize) -> Option<Self> {
        let first = TcpListener::bind("127.0.0.1:0").ok()?;
        let port = first.local_addr().ok()?.port();
        let mut listeners = vec![first];
        for n in 2..=count {
            listeners.push(TcpListener::bind(format!("127.0.0.{n}:{port}")).ok()?);
        }

        let mut servers = Vec::with_capacity(count);
        let mut addresses = Vec::with_capacity(count);
        for (i, listener) in listeners.into_iter().enumerate() {
            listener.set_nonblocking(true).ok()?;
            addresses.push(format!("127.0.0.{}", i + 1));
            servers.push(MockServer::builder().listener(listener).start().await);
        }
        Some(Self {
            servers,
            addresses,
            port,
        })
    }

    /// Makes unit `active` answer 200 on `/` and every other unit 303.
    pub async fn with_active(self, active: usize) -> Self {
        let active_url = self.url(active);
        for (i, server) in self.servers.iter().enumerate() {
            let response = if i == active {
                ResponseTemplate::new(200).set_body_string("<html>dashboard</html>")
            } else {
                ResponseTemplate::new(303).insert_header("Location", active_url.as_str())
            };
            Mock::given(method("GET"))
                .and(path("/"))
                .respond_with(response)
                .mount(server)
                .await;
        }
        self
    }

    pub fn url(&self, unit: usize) -> String {
        format!("http://{}:{}", self.addresses[unit], self.port)
    }

    /// A model whose dashboard units live at these addresses.
    pub fn model(&self) -> MockModelClient {
        MockModelClient::new()
            .with_units(APP, self.addresses.iter().cloned())
            .with_file(&format!("{APP}/0"), &config(self.port).dashboard.remote_ca_cert, PEM)
    }
}

/// Plain-http config pointing at `port`.
pub fn config(port: u16) -> DashprobeConfig {
    let mut config = DashprobeConfig::default();
    config.dashboard.scheme = "http".to_owned();
    config.dashboard.port = port;
    config
}

/// Builds a context without a custom root certificate and without backoff.
pub async fn context(model: MockModelClient, port: u16) -> SuiteContext<MockModelClient> {
    let config = config(port);
    let ca = CaCertificate::resolve(&model, &config.dashboard)
        .await
        .expect("certificate");
    let http = DashboardHttp::new(None, None, RetryPolicy::immediate(2)).expect("http client");
    SuiteContext::from_parts(model, config, http, ca)
}

/// `add-user` that completes once per username and fails on duplicates.
pub fn add_user_action() -> impl Fn(&str, &str, &BTreeMap<String, String>) -> ActionOutcome
+ Send
+ Sync
+ 'static {
    let users = Mutex::new(HashSet::new());
    move |_application: &str, _action: &str, params: &BTreeMap<String, String>| {
        let username = params.get("username").cloned().unwrap_or_default();
        let created = users.lock().unwrap().insert(username.clone());
        if created {
            ActionOutcome {
                unit: format!("{APP}/0"),
                status: ActionStatus::Completed,
                results: json!({"password": format!("pw-{username}")}),
                message: None,
            }
        } else {
            ActionOutcome {
                unit: format!("{APP}/0"),
                status: ActionStatus::Failed,
                results: json!({}),
                message: Some("User already exists".to_owned()),
            }
        }
    }
}

/// `ceph config-key exists` that succeeds for every key.
pub fn all_keys_exist(_application: &str, _command: &str) -> CommandOutcome {
    CommandOutcome {
        unit: format!("{APP}/0"),
        code: 0,
        stdout: String::new(),
        stderr: String::new(),
    }
}
