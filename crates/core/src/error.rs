//! 에러 타입 — 도메인별 에러 정의

/// dashprobe 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DashprobeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 오케스트레이션(모델) 클라이언트 에러
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// 대시보드 HTTP 전송 에러 (재시도 소진 후)
    #[error("http error: {0}")]
    Http(String),

    /// 시나리오 검증 실패
    #[error("scenario '{scenario}' failed: {message}")]
    Assertion { scenario: String, message: String },

    /// 릴리스 문자열 파싱 에러
    #[error("release error: {0}")]
    Release(#[from] ReleaseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 오케스트레이션 클라이언트 에러
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// `juju` 실행 자체가 실패 (바이너리 없음, 권한 등)
    #[error("failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// 명령이 0이 아닌 코드로 종료
    #[error("command '{command}' exited with {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// 명령 타임아웃
    #[error("command '{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// 출력 파싱 실패
    #[error("unexpected output from '{command}': {reason}")]
    Output { command: String, reason: String },

    /// 애플리케이션을 찾을 수 없음
    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    /// 유닛을 찾을 수 없음
    #[error("unit not found: {0}")]
    UnitNotFound(String),
}

/// 릴리스 페어 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// 알 수 없는 `<series>_<codename>` 조합
    #[error("unknown release pair: {0}")]
    UnknownPair(String),

    /// 알 수 없는 Ubuntu 시리즈
    #[error("unknown series: {0}")]
    UnknownSeries(String),

    /// 해석할 수 없는 `source` 설정값
    #[error("unsupported source '{0}'")]
    UnsupportedSource(String),
}
