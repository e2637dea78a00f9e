//! 설정 관리 — dashprobe.toml 파싱 및 런타임 설정
//!
//! [`DashprobeConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DASHPROBE_DASHBOARD_PORT=8443` 형식)
//! 3. 설정 파일 (`dashprobe.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), dashprobe_core::error::DashprobeError> {
//! use dashprobe_core::config::DashprobeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DashprobeConfig::load("dashprobe.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DashprobeConfig::parse("[dashboard]\nport = 8443")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, DashprobeError};
use crate::release::Release;

/// dashprobe 통합 설정
///
/// `dashprobe.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashprobeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 오케스트레이션 모델 설정
    #[serde(default)]
    pub model: ModelConfig,
    /// 대시보드 설정
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// HTTP 재시도 설정
    #[serde(default)]
    pub retry: RetryConfig,
    /// SAML 시나리오 설정
    #[serde(default)]
    pub saml: SamlConfig,
}

impl DashprobeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DashprobeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 사용하여 로드합니다.
    ///
    /// 파일이 존재하지만 파싱에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, DashprobeError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(DashprobeError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DashprobeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DashprobeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DashprobeError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DashprobeError> {
        toml::from_str(toml_str).map_err(|e| {
            DashprobeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DASHPROBE_{SECTION}_{FIELD}`
    /// 예: `DASHPROBE_DASHBOARD_PORT=8443`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DASHPROBE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DASHPROBE_GENERAL_LOG_FORMAT");

        // Model
        override_string(&mut self.model.juju_binary, "DASHPROBE_MODEL_JUJU_BINARY");
        override_string(&mut self.model.model, "DASHPROBE_MODEL_MODEL");
        override_u64(
            &mut self.model.command_timeout_secs,
            "DASHPROBE_MODEL_COMMAND_TIMEOUT_SECS",
        );

        // Dashboard
        override_string(
            &mut self.dashboard.application,
            "DASHPROBE_DASHBOARD_APPLICATION",
        );
        override_string(&mut self.dashboard.scheme, "DASHPROBE_DASHBOARD_SCHEME");
        override_u16(&mut self.dashboard.port, "DASHPROBE_DASHBOARD_PORT");
        override_string(&mut self.dashboard.ca_cert, "DASHPROBE_DASHBOARD_CA_CERT");
        override_string(
            &mut self.dashboard.remote_ca_cert,
            "DASHPROBE_DASHBOARD_REMOTE_CA_CERT",
        );
        override_string(&mut self.dashboard.user_role, "DASHPROBE_DASHBOARD_USER_ROLE");
        override_string(
            &mut self.dashboard.username_prefix,
            "DASHPROBE_DASHBOARD_USERNAME_PREFIX",
        );
        override_u64(
            &mut self.dashboard.request_timeout_secs,
            "DASHPROBE_DASHBOARD_REQUEST_TIMEOUT_SECS",
        );

        // Retry
        override_u32(&mut self.retry.max_attempts, "DASHPROBE_RETRY_MAX_ATTEMPTS");
        override_u64(
            &mut self.retry.multiplier_secs,
            "DASHPROBE_RETRY_MULTIPLIER_SECS",
        );
        override_u64(&mut self.retry.min_wait_secs, "DASHPROBE_RETRY_MIN_WAIT_SECS");
        override_u64(&mut self.retry.max_wait_secs, "DASHPROBE_RETRY_MAX_WAIT_SECS");

        // SAML
        override_string(
            &mut self.saml.release_application,
            "DASHPROBE_SAML_RELEASE_APPLICATION",
        );
        override_string(&mut self.saml.min_release, "DASHPROBE_SAML_MIN_RELEASE");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DashprobeError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.model.juju_binary.is_empty() {
            return Err(invalid("model.juju_binary", "must not be empty".to_owned()));
        }

        if self.model.command_timeout_secs == 0 {
            return Err(invalid(
                "model.command_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.dashboard.application.is_empty() {
            return Err(invalid(
                "dashboard.application",
                "must not be empty".to_owned(),
            ));
        }

        // `http`는 TLS 없는 테스트 배포용이며 스위트 시작 시 경고가 기록됩니다.
        let valid_schemes = ["https", "http"];
        if !valid_schemes.contains(&self.dashboard.scheme.as_str()) {
            return Err(invalid(
                "dashboard.scheme",
                format!("must be one of: {}", valid_schemes.join(", ")),
            ));
        }

        if self.dashboard.port == 0 {
            return Err(invalid("dashboard.port", "must be 1-65535".to_owned()));
        }

        if self.dashboard.ca_cert.is_empty() && self.dashboard.remote_ca_cert.is_empty() {
            return Err(invalid(
                "dashboard.remote_ca_cert",
                "must be set when dashboard.ca_cert is empty".to_owned(),
            ));
        }

        if self.dashboard.user_role.is_empty() {
            return Err(invalid("dashboard.user_role", "must not be empty".to_owned()));
        }

        // 재시도 설정 검증
        if self.retry.max_attempts == 0 || self.retry.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(invalid(
                "retry.max_attempts",
                format!("must be 1-{MAX_RETRY_ATTEMPTS}"),
            ));
        }

        if self.retry.min_wait_secs > self.retry.max_wait_secs {
            return Err(invalid(
                "retry.min_wait_secs",
                "must not exceed retry.max_wait_secs".to_owned(),
            ));
        }

        if self.retry.max_wait_secs > MAX_RETRY_WAIT_SECS {
            return Err(invalid(
                "retry.max_wait_secs",
                format!("must be 0-{MAX_RETRY_WAIT_SECS}"),
            ));
        }

        if self.saml.release_application.is_empty() {
            return Err(invalid(
                "saml.release_application",
                "must not be empty".to_owned(),
            ));
        }

        if let Err(e) = self.saml.min_release.parse::<Release>() {
            return Err(invalid("saml.min_release", e.to_string()));
        }

        Ok(())
    }
}

/// 설정 상한값 상수
const MAX_RETRY_ATTEMPTS: u32 = 100;
const MAX_RETRY_WAIT_SECS: u64 = 600;

fn invalid(field: &str, reason: String) -> DashprobeError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 오케스트레이션 모델 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `juju` 실행 파일 경로
    pub juju_binary: String,
    /// 대상 모델명 (빈 문자열이면 현재 모델)
    pub model: String,
    /// 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            juju_binary: "juju".to_owned(),
            model: String::new(),
            command_timeout_secs: 300,
        }
    }
}

impl ModelConfig {
    /// 명령 타임아웃을 `Duration`으로 반환합니다.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// 대시보드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// 대시보드 애플리케이션명
    pub application: String,
    /// URL 스킴 (https, http)
    pub scheme: String,
    /// 대시보드 포트
    pub port: u16,
    /// 로컬 CA 인증서 경로 (빈 문자열이면 유닛에서 복사)
    pub ca_cert: String,
    /// 유닛의 CA 인증서 경로
    pub remote_ca_cert: String,
    /// 생성할 사용자의 역할
    pub user_role: String,
    /// 랜덤 사용자명 접두어
    pub username_prefix: String,
    /// HTTP 요청 타임아웃 (초, 0이면 라이브러리 기본값)
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            application: "ceph-dashboard".to_owned(),
            scheme: "https".to_owned(),
            port: 8443,
            ca_cert: String::new(),
            remote_ca_cert: "/usr/local/share/ca-certificates/vault_ca_cert_dashboard.crt"
                .to_owned(),
            user_role: "administrator".to_owned(),
            username_prefix: "dashprobe-user".to_owned(),
            request_timeout_secs: 0,
        }
    }
}

impl DashboardConfig {
    /// 요청 타임아웃 (설정되지 않았으면 `None`)
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// HTTP 재시도 설정
///
/// 대기 시간은 `multiplier * 2^(attempt-1)`초를 `[min_wait, max_wait]`로 제한합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 지수 백오프 배수 (초)
    pub multiplier_secs: u64,
    /// 최소 대기 시간 (초)
    pub min_wait_secs: u64,
    /// 최대 대기 시간 (초)
    pub max_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            multiplier_secs: 1,
            min_wait_secs: 5,
            max_wait_secs: 10,
        }
    }
}

/// SAML 시나리오 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlConfig {
    /// 릴리스를 판정할 애플리케이션
    pub release_application: String,
    /// SAML 시나리오를 실행할 최소 릴리스 (`<series>_<codename>`)
    pub min_release: String,
}

impl Default for SamlConfig {
    fn default() -> Self {
        Self {
            release_application: "ceph-mon".to_owned(),
            min_release: "focal_yoga".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
