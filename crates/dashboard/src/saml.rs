//! SAML SSO 확인
//!
//! 릴리스가 기준(`saml.min_release`) 이상일 때만 실행됩니다.
//!
//! 1. 활성 엔드포인트 확인
//! 2. CA 인증서로 IdP 메타데이터를 만들어 임시 파일에 기록
//! 3. `saml-base-url`, `saml-idp-metadata` 설정
//! 4. `/auth/saml2/login`이 리다이렉트(3xx + `Location`)하는지 확인
//! 5. `/auth/saml2/metadata`가 `200 OK`인지 확인

use std::collections::BTreeMap;
use std::io::Write;

use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use dashprobe_core::release::Release;
use dashprobe_model::ModelClient;

use crate::context::SuiteContext;
use crate::error::DashboardError;
use crate::probe::require_active_endpoint;
use crate::release::application_release;

const SCENARIO: &str = "saml";

/// 로그인 경로
pub const LOGIN_PATH: &str = "auth/saml2/login";
/// SP 메타데이터 경로
pub const METADATA_PATH: &str = "auth/saml2/metadata";

const IDP_METADATA_TEMPLATE: &str = r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
    <ds:X509Data>
        <ds:X509Certificate>
            {certificate}
        </ds:X509Certificate>
    </ds:X509Data>
</ds:KeyInfo>
"#;

/// SAML 확인 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SamlCheck {
    /// 로그인 리다이렉트와 메타데이터 확인 완료
    Verified { url: String, redirect: String },
    /// 릴리스가 기준 미만이라 건너뜀
    Skipped { release: Release, minimum: Release },
}

/// CA 인증서 텍스트를 IdP 메타데이터 템플릿에 삽입합니다.
pub fn render_idp_metadata(certificate: &str) -> String {
    IDP_METADATA_TEMPLATE.replace("{certificate}", certificate)
}

/// 릴리스 기준을 확인하고 SAML 로그인 흐름을 검증합니다.
pub async fn check_saml<M: ModelClient>(ctx: &SuiteContext<M>) -> Result<SamlCheck, DashboardError> {
    let saml = &ctx.config().saml;
    let minimum: Release = saml.min_release.parse()?;
    let release = application_release(ctx.model(), &saml.release_application).await?;
    if release < minimum {
        info!(release = %release, minimum = %minimum, "release too old for SAML, skipping");
        return Ok(SamlCheck::Skipped { release, minimum });
    }

    let url = require_active_endpoint(ctx, SCENARIO).await?;

    // 시나리오가 끝날 때까지 삭제되면 안 됨
    let mut metadata = NamedTempFile::new()?;
    metadata.write_all(render_idp_metadata(&ctx.ca().text()).as_bytes())?;
    metadata.flush()?;

    let settings = BTreeMap::from([
        ("saml-base-url".to_owned(), url.clone()),
        (
            "saml-idp-metadata".to_owned(),
            format!("file://{}", metadata.path().display()),
        ),
    ]);
    ctx.model()
        .set_application_config(ctx.application(), &settings)
        .await?;
    info!(url = %url, "enabled SAML on dashboard");

    let login_url = format!("{url}/{LOGIN_PATH}");
    let response = ctx.http().get(&login_url, false).await?;
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let redirect = match location {
        Some(location) if status.is_redirection() => location,
        _ => {
            return Err(DashboardError::assertion(
                SCENARIO,
                format!("{login_url} expected a redirect, got {status}"),
            ));
        }
    };

    let metadata_url = format!("{url}/{METADATA_PATH}");
    let status = ctx.http().get(&metadata_url, false).await?.status();
    if status != StatusCode::OK {
        return Err(DashboardError::assertion(
            SCENARIO,
            format!("{metadata_url} expected 200 OK, got {status}"),
        ));
    }

    info!(url = %url, redirect = %redirect, "SAML login redirects and metadata is served");
    drop(metadata);
    Ok(SamlCheck::Verified { url, redirect })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_embeds_certificate() {
        let xml = render_idp_metadata("MIIBfake");
        assert!(xml.starts_with("<ds:KeyInfo xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">"));
        assert!(xml.contains("<ds:X509Certificate>\n            MIIBfake\n"));
        assert!(!xml.contains("{certificate}"));
    }

    #[test]
    fn skipped_serializes_pairs() {
        let check = SamlCheck::Skipped {
            release: "focal_xena".parse().unwrap(),
            minimum: "focal_yoga".parse().unwrap(),
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["result"], "skipped");
        assert_eq!(json["release"], "focal_xena");
        assert_eq!(json["minimum"], "focal_yoga");
    }
}
