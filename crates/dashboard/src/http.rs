//! 재시도 HTTP 클라이언트
//!
//! [`DashboardHttp`]는 연결 수준 실패(연결 거부, 연결 타임아웃)에서만 재시도합니다.
//! 요청이 전달된 뒤의 응답 대기 타임아웃은 재시도하지 않습니다.
//! 4xx/5xx 응답은 일반 응답으로 반환되어 호출자가 검증합니다.
//!
//! TLS 검증은 끌 수 없습니다. CA 번들이 주어지면 루트 인증서로 추가됩니다.
//!
//! # 백오프
//!
//! `multiplier * 2^(attempt-1)` 초를 `[min, max]` 범위로 제한합니다.
//! 기본값(1, 5, 10)에서는 5, 5, 5, 8, 10, 10, ... 초를 기다립니다.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Certificate, Client, RequestBuilder, Response, redirect};
use serde::Serialize;
use tracing::{debug, warn};

use dashprobe_core::config::RetryConfig;
use dashprobe_core::metrics as m;

use crate::error::DashboardError;

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도를 포함한 최대 시도 횟수
    pub max_attempts: u32,
    /// 지수 백오프 배수
    pub multiplier: Duration,
    /// 최소 대기 시간
    pub min_wait: Duration,
    /// 최대 대기 시간
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// `[retry]` 설정 섹션에서 정책을 생성합니다.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            multiplier: Duration::from_secs(config.multiplier_secs),
            min_wait: Duration::from_secs(config.min_wait_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    /// 대기 없이 `max_attempts`번 시도하는 정책 (테스트용)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// `attempt`번째 실패 후 대기 시간 (1부터 시작)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let raw = self.multiplier.saturating_mul(factor);
        raw.max(self.min_wait).min(self.max_wait)
    }
}

/// 연결 수준 실패만 재시도 대상입니다. 연결 타임아웃도 `is_connect()`로 보고됩니다.
fn is_retriable(err: &reqwest::Error) -> bool {
    err.is_connect()
}

/// 대시보드 HTTP 클라이언트
///
/// 리다이렉트를 따르는 클라이언트와 따르지 않는 클라이언트를 함께 보유합니다.
/// 생성 후에는 읽기 전용이며 `Clone`은 내부 커넥션 풀을 공유합니다.
#[derive(Debug, Clone)]
pub struct DashboardHttp {
    following: Client,
    non_following: Client,
    retry: RetryPolicy,
}

impl DashboardHttp {
    /// HTTP 클라이언트를 생성합니다.
    ///
    /// # Arguments
    /// * `ca_pem` - 추가 루트 인증서 (PEM). `None`이면 시스템 기본 루트만 사용
    /// * `request_timeout` - 요청 전체 타임아웃이자 연결 타임아웃. `None`이면 라이브러리 기본값
    /// * `retry` - 재시도 정책
    pub fn new(
        ca_pem: Option<&[u8]>,
        request_timeout: Option<Duration>,
        retry: RetryPolicy,
    ) -> Result<Self, DashboardError> {
        let certificate = ca_pem
            .map(Certificate::from_pem)
            .transpose()
            .map_err(|e| DashboardError::Tls(format!("invalid CA certificate: {e}")))?;

        let build = |policy: redirect::Policy| {
            let mut builder = Client::builder().redirect(policy);
            if let Some(cert) = &certificate {
                builder = builder.add_root_certificate(cert.clone());
            }
            if let Some(timeout) = request_timeout {
                builder = builder.timeout(timeout).connect_timeout(timeout);
            }
            builder
                .build()
                .map_err(|e| DashboardError::Tls(format!("failed to build http client: {e}")))
        };

        Ok(Self {
            following: build(redirect::Policy::default())?,
            non_following: build(redirect::Policy::none())?,
            retry,
        })
    }

    /// 재시도 정책
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// GET 요청을 보냅니다.
    pub async fn get(&self, url: &str, follow_redirects: bool) -> Result<Response, DashboardError> {
        let client = if follow_redirects {
            &self.following
        } else {
            &self.non_following
        };
        self.send_with_retry("GET", url, || client.get(url)).await
    }

    /// JSON 본문으로 POST 요청을 보냅니다.
    ///
    /// `headers`에 `Content-Type`이 없으면 `application/json`이 설정됩니다.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &HeaderMap,
    ) -> Result<Response, DashboardError> {
        self.send_with_retry("POST", url, || {
            self.following.post(url).headers(headers.clone()).json(body)
        })
        .await
    }

    /// 요청 빌더는 본문 때문에 복제할 수 없으므로 시도마다 새로 만듭니다.
    async fn send_with_retry<F>(
        &self,
        method: &'static str,
        url: &str,
        build: F,
    ) -> Result<Response, DashboardError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            metrics::counter!(m::HTTP_REQUESTS_TOTAL, m::LABEL_METHOD => method).increment(1);
            debug!(method, url, attempt, "sending request");

            match build().send().await {
                Ok(response) => {
                    debug!(method, url, status = response.status().as_u16(), "response received");
                    return Ok(response);
                }
                Err(e) if attempt < self.retry.max_attempts && is_retriable(&e) => {
                    let wait = self.retry.backoff(attempt);
                    warn!(
                        method,
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient http failure, retrying"
                    );
                    metrics::counter!(m::HTTP_RETRIES_TOTAL).increment(1);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(method, url, attempt, error = %e, "http request failed");
                    return Err(DashboardError::Http {
                        url: url.to_owned(),
                        source: e,
                    });
                }
            }
        }
    }
}
