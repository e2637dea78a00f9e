//! 시나리오 공유 컨텍스트
//!
//! 스위트 시작 시 한 번 생성되며 이후 읽기 전용입니다.

use std::net::IpAddr;

use tracing::{debug, warn};

use dashprobe_core::config::DashprobeConfig;
use dashprobe_model::ModelClient;

use crate::certs::CaCertificate;
use crate::error::DashboardError;
use crate::http::{DashboardHttp, RetryPolicy};

/// 시나리오가 공유하는 상태: 모델 클라이언트, HTTP 클라이언트, 설정, CA 인증서
pub struct SuiteContext<M> {
    model: M,
    config: DashprobeConfig,
    http: DashboardHttp,
    ca: CaCertificate,
}

impl<M: ModelClient> SuiteContext<M> {
    /// CA 인증서를 확보하고 HTTP 클라이언트를 생성합니다.
    ///
    /// `dashboard.scheme`이 `http`이면 TLS 검증 없이 진행하며 경고를 남깁니다.
    pub async fn build(model: M, config: DashprobeConfig) -> Result<Self, DashboardError> {
        if config.dashboard.scheme == "http" {
            warn!(
                application = %config.dashboard.application,
                port = config.dashboard.port,
                "dashboard.scheme is http, responses are not TLS-verified"
            );
        }
        let ca = CaCertificate::resolve(&model, &config.dashboard).await?;
        let http = DashboardHttp::new(
            Some(ca.pem()),
            config.dashboard.request_timeout(),
            RetryPolicy::from_config(&config.retry),
        )?;
        debug!(ca = %ca.path().display(), "suite context ready");
        Ok(Self::from_parts(model, config, http, ca))
    }

    /// 미리 준비된 구성 요소로 컨텍스트를 만듭니다.
    pub fn from_parts(
        model: M,
        config: DashprobeConfig,
        http: DashboardHttp,
        ca: CaCertificate,
    ) -> Self {
        Self {
            model,
            config,
            http,
            ca,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &DashprobeConfig {
        &self.config
    }

    pub fn http(&self) -> &DashboardHttp {
        &self.http
    }

    pub fn ca(&self) -> &CaCertificate {
        &self.ca
    }

    /// 대시보드 애플리케이션 이름
    pub fn application(&self) -> &str {
        &self.config.dashboard.application
    }

    /// 유닛 주소의 기본 URL
    pub fn unit_url(&self, address: &str) -> String {
        unit_url(&self.config.dashboard.scheme, address, self.config.dashboard.port)
    }
}

/// `{scheme}://{address}:{port}`. IPv6 주소는 대괄호로 감쌉니다.
pub fn unit_url(scheme: &str, address: &str, port: u16) -> String {
    let host = match address.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{v6}]"),
        _ => address.to_owned(),
    };
    format!("{scheme}://{host}:{port}")
}
