//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 익스포터는 없으며, 설치된 recorder가 있을 때만 값이 수집됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `dashprobe_`
//! - 접미어: `_total` (counter)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// HTTP 메서드 레이블 키 (GET, POST)
pub const LABEL_METHOD: &str = "method";

/// 결과 레이블 키 (passed, failed, skipped)
pub const LABEL_RESULT: &str = "result";

// ─── HTTP 메트릭 ───────────────────────────────────────────────────

/// 전송된 HTTP 요청 수 (counter, label: method)
pub const HTTP_REQUESTS_TOTAL: &str = "dashprobe_http_requests_total";

/// 연결 실패로 인한 재시도 횟수 (counter)
pub const HTTP_RETRIES_TOTAL: &str = "dashprobe_http_retries_total";

// ─── 시나리오 메트릭 ───────────────────────────────────────────────

/// 실행된 시나리오 수 (counter, label: result)
pub const SCENARIOS_TOTAL: &str = "dashprobe_scenarios_total";
