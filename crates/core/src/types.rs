//! 도메인 타입 — 워크스페이스 전역에서 사용되는 공통 타입
//!
//! 오케스트레이션 클라이언트와 대시보드 시나리오가 주고받는
//! 액션/명령 실행 결과를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 액션 완료 상태
///
/// Juju 액션이 보고하는 상태 문자열을 그대로 표현합니다.
/// 알 수 없는 값은 `Other`로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// 정상 완료
    Completed,
    /// 실패
    Failed,
    /// 대기 중
    Pending,
    /// 실행 중
    Running,
    /// 취소됨
    Cancelled,
    /// 기타 상태
    #[serde(untagged)]
    Other(String),
}

impl ActionStatus {
    /// 상태 문자열을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "cancelled" | "aborted" => Self::Cancelled,
            other => Self::Other(other.to_owned()),
        }
    }

    /// 정상 완료 여부
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// 액션 실행 결과
///
/// 리더 유닛에서 실행된 액션의 상태와 구조화된 결과 페이로드를 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// 액션이 실행된 유닛 (예: `ceph-dashboard/0`)
    pub unit: String,
    /// 완료 상태
    pub status: ActionStatus,
    /// 결과 페이로드 (`results` 맵)
    pub results: serde_json::Value,
    /// 실패 메시지 (있을 경우)
    pub message: Option<String>,
}

impl ActionOutcome {
    /// 결과 페이로드에서 문자열 필드를 가져옵니다.
    pub fn result_str(&self, key: &str) -> Option<&str> {
        self.results.get(key).and_then(serde_json::Value::as_str)
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.status, self.unit)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// 원격 명령 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// 명령이 실행된 유닛
    pub unit: String,
    /// 종료 코드
    pub code: i32,
    /// 표준 출력
    pub stdout: String,
    /// 표준 에러
    pub stderr: String,
}

impl CommandOutcome {
    /// 종료 코드가 0인지 확인합니다.
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}
