//! 대시보드 시나리오 에러 타입
//!
//! [`DashboardError`]는 전송 계층 실패와 애플리케이션 수준 실패(검증 실패)를
//! 구분합니다. `From<DashboardError> for DashprobeError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use dashprobe_core::error::{ConfigError, DashprobeError, ModelError, ReleaseError};

/// 대시보드 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// 재시도 소진 후에도 실패한 HTTP 전송
    #[error("request to '{url}' failed: {source}")]
    Http {
        /// 요청 URL
        url: String,
        /// 마지막 전송 에러
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 클라이언트 생성 실패 (잘못된 CA 번들 등)
    #[error("tls setup failed: {0}")]
    Tls(String),

    /// CA 인증서 확보 실패
    #[error("certificate '{path}': {reason}")]
    Certificate {
        /// 인증서 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 오케스트레이션 모델 에러
    #[error(transparent)]
    Model(#[from] ModelError),

    /// 시나리오 검증 실패
    #[error("scenario '{scenario}' failed: {message}")]
    Assertion {
        /// 시나리오 이름
        scenario: String,
        /// 실패 메시지
        message: String,
    },

    /// 릴리스 해석 실패
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// 알 수 없는 시나리오 이름
    #[error("unknown scenario '{name}' (known: {known})")]
    UnknownScenario {
        /// 요청된 이름
        name: String,
        /// 사용 가능한 이름 목록
        known: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// 검증 실패 에러를 생성합니다.
    pub fn assertion(scenario: &str, message: impl Into<String>) -> Self {
        Self::Assertion {
            scenario: scenario.to_owned(),
            message: message.into(),
        }
    }
}

impl From<DashboardError> for DashprobeError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Http { .. } | DashboardError::Tls(_) => {
                DashprobeError::Http(err.to_string())
            }
            DashboardError::Certificate { .. } => DashprobeError::Io(std::io::Error::other(
                err.to_string(),
            )),
            DashboardError::Model(e) => DashprobeError::Model(e),
            DashboardError::Assertion { scenario, message } => {
                DashprobeError::Assertion { scenario, message }
            }
            DashboardError::Release(e) => DashprobeError::Release(e),
            DashboardError::UnknownScenario { name, known } => {
                DashprobeError::Config(ConfigError::InvalidValue {
                    field: "scenario".to_owned(),
                    reason: format!("unknown scenario '{name}' (known: {known})"),
                })
            }
            DashboardError::Io(e) => DashprobeError::Io(e),
        }
    }
}
