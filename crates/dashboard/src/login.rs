//! REST API 로그인
//!
//! 새 사용자를 만들고 그 자격 증명으로 `POST {base}/api/auth`를 호출합니다.
//! 성공 시 대시보드는 `201 Created`를 응답합니다.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::info;

use dashprobe_model::ModelClient;

use crate::context::SuiteContext;
use crate::error::DashboardError;
use crate::users::{create_user, password_from, random_username};

const SCENARIO: &str = "access_dashboard";

/// 대시보드 REST API 버전 미디어 타입
pub const API_MEDIA_TYPE: &str = "application/vnd.ceph.api.v1.0";

/// 인증 엔드포인트 경로
pub const AUTH_PATH: &str = "api/auth";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

fn auth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static(API_MEDIA_TYPE));
    headers
}

/// `base_url`로 로그인할 수 있는지 확인합니다.
pub async fn access_dashboard<M: ModelClient>(
    ctx: &SuiteContext<M>,
    base_url: &str,
) -> Result<(), DashboardError> {
    let dashboard = &ctx.config().dashboard;
    let username = random_username(&dashboard.username_prefix);
    let outcome =
        create_user(ctx.model(), ctx.application(), &username, &dashboard.user_role).await?;
    let password = password_from(&outcome, SCENARIO)?;

    let url = format!("{}/{AUTH_PATH}", base_url.trim_end_matches('/'));
    let credentials = Credentials {
        username: &username,
        password: &password,
    };
    let status = ctx
        .http()
        .post_json(&url, &credentials, &auth_headers())
        .await?
        .status();

    if status != StatusCode::CREATED {
        return Err(DashboardError::assertion(
            SCENARIO,
            format!("login as '{username}' at {url} expected 201 Created, got {status}"),
        ));
    }
    info!(username = %username, url = %url, "dashboard login succeeded");
    Ok(())
}
