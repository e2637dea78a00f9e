//! 시나리오 실행기
//!
//! 시나리오는 고정된 순서로 하나씩 실행됩니다. 한 시나리오의 실패는 그
//! 시나리오만 끝내며 나머지는 계속 실행됩니다.
//!
//! # 사용 예시
//! ```ignore
//! let suite = Suite::new(JujuCliClient::from_config(&config.model), config).await?;
//! let report = suite.run(&[]).await?;
//! assert!(report.is_success());
//! ```

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use dashprobe_core::config::DashprobeConfig;
use dashprobe_core::metrics as m;
use dashprobe_model::ModelClient;

use crate::context::SuiteContext;
use crate::error::DashboardError;
use crate::saml::SamlCheck;
use crate::{keys, login, probe, saml, users};

/// 검증 시나리오
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// 정확히 하나의 활성 유닛과 나머지 리다이렉트
    DashboardUnits,
    /// 사용자 생성과 중복 거부
    CreateUser,
    /// 새 사용자로 REST API 로그인
    AccessDashboard,
    /// 동반 서비스의 config-key 존재
    CephKeys,
    /// SAML SSO
    Saml,
}

impl Scenario {
    /// 실행 순서대로 나열한 전체 시나리오
    pub const ALL: [Scenario; 5] = [
        Scenario::DashboardUnits,
        Scenario::CreateUser,
        Scenario::AccessDashboard,
        Scenario::CephKeys,
        Scenario::Saml,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DashboardUnits => "dashboard_units",
            Self::CreateUser => "create_user",
            Self::AccessDashboard => "access_dashboard",
            Self::CephKeys => "ceph_keys",
            Self::Saml => "saml",
        }
    }

    /// 이름으로 시나리오를 찾습니다. `-`와 `_`를 구분하지 않습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_");
        Self::ALL.into_iter().find(|s| s.name() == normalized)
    }

    /// 필터에 해당하는 시나리오를 실행 순서대로 반환합니다. 빈 필터는 전체입니다.
    pub fn select<S: AsRef<str>>(filter: &[S]) -> Result<Vec<Self>, DashboardError> {
        if filter.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        let mut wanted = Vec::with_capacity(filter.len());
        for name in filter {
            let scenario = Self::from_name(name.as_ref()).ok_or_else(|| {
                DashboardError::UnknownScenario {
                    name: name.as_ref().to_owned(),
                    known: Self::ALL.map(|s| s.name()).join(", "),
                }
            })?;
            wanted.push(scenario);
        }
        Ok(Self::ALL
            .into_iter()
            .filter(|s| wanted.contains(s))
            .collect())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 시나리오 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Skipped { reason: String },
    Failed { message: String },
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// 시나리오 하나의 보고서
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// 스위트 전체 보고서
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    fn push(&mut self, report: ScenarioReport) {
        match report.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.scenarios.push(report);
    }

    /// 실패한 시나리오가 없으면 `true`
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// 시나리오 스위트
pub struct Suite<M> {
    ctx: SuiteContext<M>,
}

impl<M: ModelClient> Suite<M> {
    /// CA 인증서와 HTTP 클라이언트를 준비해 스위트를 만듭니다.
    pub async fn new(model: M, config: DashprobeConfig) -> Result<Self, DashboardError> {
        Ok(Self::from_context(SuiteContext::build(model, config).await?))
    }

    pub fn from_context(ctx: SuiteContext<M>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SuiteContext<M> {
        &self.ctx
    }

    /// 필터에 해당하는 시나리오를 순서대로 실행합니다.
    ///
    /// 알 수 없는 시나리오 이름은 아무것도 실행하기 전에 에러가 됩니다.
    pub async fn run<S: AsRef<str>>(&self, filter: &[S]) -> Result<SuiteReport, DashboardError> {
        let scenarios = Scenario::select(filter)?;
        let mut report = SuiteReport::default();
        for scenario in scenarios {
            report.push(self.run_scenario(scenario).await);
        }
        info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "suite finished"
        );
        Ok(report)
    }

    /// 시나리오 하나를 실행하고 보고서를 만듭니다.
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioReport {
        info!(scenario = %scenario, "scenario started");
        let started = Instant::now();

        let outcome = match self.execute(scenario).await {
            Ok(outcome) => outcome,
            Err(DashboardError::Assertion { message, .. }) => Outcome::Failed { message },
            Err(e) => Outcome::Failed {
                message: e.to_string(),
            },
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Outcome::Failed { message } => {
                error!(scenario = %scenario, duration_ms, error = %message, "scenario failed");
            }
            other => info!(scenario = %scenario, duration_ms, outcome = %other, "scenario finished"),
        }
        metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_RESULT => outcome.label()).increment(1);

        ScenarioReport {
            name: scenario.name().to_owned(),
            outcome,
            duration_ms,
        }
    }

    async fn execute(&self, scenario: Scenario) -> Result<Outcome, DashboardError> {
        let ctx = &self.ctx;
        match scenario {
            Scenario::DashboardUnits => {
                probe::verify_topology(ctx).await?;
            }
            Scenario::CreateUser => users::check_create_user(ctx).await?,
            Scenario::AccessDashboard => {
                let url = probe::require_active_endpoint(ctx, scenario.name()).await?;
                login::access_dashboard(ctx, &url).await?;
            }
            Scenario::CephKeys => {
                keys::check_expected_keys(ctx.model(), ctx.application()).await?;
            }
            Scenario::Saml => {
                if let SamlCheck::Skipped { release, minimum } = saml::check_saml(ctx).await? {
                    return Ok(Outcome::Skipped {
                        reason: format!("release {release} is older than {minimum}"),
                    });
                }
            }
        }
        Ok(Outcome::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenarios_have_fixed_order() {
        let names: Vec<&str> = Scenario::ALL.iter().map(Scenario::name).collect();
        assert_eq!(
            names,
            vec!["dashboard_units", "create_user", "access_dashboard", "ceph_keys", "saml"]
        );
    }

    #[test]
    fn names_accept_dashes() {
        assert_eq!(Scenario::from_name("ceph-keys"), Some(Scenario::CephKeys));
        assert_eq!(Scenario::from_name("saml"), Some(Scenario::Saml));
        assert_eq!(Scenario::from_name("nope"), None);
    }

    #[test]
    fn select_keeps_execution_order() {
        let selected = Scenario::select(&["saml", "dashboard_units"]).unwrap();
        assert_eq!(selected, vec![Scenario::DashboardUnits, Scenario::Saml]);
        let empty: [&str; 0] = [];
        assert_eq!(Scenario::select(&empty).unwrap().len(), 5);
    }

    #[test]
    fn select_rejects_unknown_names() {
        let err = Scenario::select(&["dashboard_units", "bogus"]).unwrap_err();
        match err {
            DashboardError::UnknownScenario { name, known } => {
                assert_eq!(name, "bogus");
                assert!(known.contains("create_user"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = SuiteReport::default();
        for outcome in [
            Outcome::Passed,
            Outcome::Failed {
                message: "x".to_owned(),
            },
            Outcome::Skipped {
                reason: "old".to_owned(),
            },
            Outcome::Passed,
        ] {
            report.push(ScenarioReport {
                name: "s".to_owned(),
                outcome,
                duration_ms: 1,
            });
        }
        assert_eq!((report.passed, report.failed, report.skipped), (2, 1, 1));
        assert!(!report.is_success());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::Failed {
            message: "boom".to_owned(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "message": "boom"}));
    }
}
