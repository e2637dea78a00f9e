//! 배포 릴리스 해석
//!
//! 애플리케이션의 `source`(또는 `openstack-origin`) 설정값과 시리즈로
//! [`Release`] 페어를 결정합니다.

use serde_json::Value;
use tracing::debug;

use dashprobe_core::release::Release;
use dashprobe_model::ModelClient;

use crate::error::DashboardError;

/// 릴리스를 나타내는 설정 옵션 (우선순위 순)
const SOURCE_OPTIONS: &[&str] = &["source", "openstack-origin"];

/// `application`이 배포된 릴리스 페어를 조회합니다.
pub async fn application_release<M: ModelClient>(
    model: &M,
    application: &str,
) -> Result<Release, DashboardError> {
    let config = model.application_config(application).await?;
    let source = SOURCE_OPTIONS
        .iter()
        .find_map(|option| config.get(*option).and_then(Value::as_str))
        .unwrap_or_default();
    let series = model.application_series(application).await?;

    let release = Release::from_source(source, &series)?;
    debug!(application, source, series = %series, release = %release, "resolved release");
    Ok(release)
}
