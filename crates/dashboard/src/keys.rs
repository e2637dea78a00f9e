//! 설정 키 존재 확인
//!
//! 동반 서비스가 배포되어 있으면 대시보드가 해당 서비스 정보를 클러스터의
//! config-key 저장소에 등록했어야 합니다.

use tracing::info;

use dashprobe_model::ModelClient;

use crate::error::DashboardError;

const SCENARIO: &str = "ceph_keys";

/// 대시보드 모듈 설정 키 접두어
const DASHBOARD_KEY_PREFIX: &str = "config/mgr/mgr/dashboard/";

/// 애플리케이션 -> 대시보드 모듈 설정 키
const DASHBOARD_KEYS: &[(&str, &[&str])] = &[
    ("ceph-radosgw", &["RGW_API_ACCESS_KEY", "RGW_API_SECRET_KEY"]),
    ("grafana", &["GRAFANA_API_URL"]),
    ("prometheus", &["PROMETHEUS_API_HOST"]),
];

/// iSCSI 게이트웨이 설정 키 (접두어 없음)
const ISCSI_KEY: &str = "mgr/dashboard/_iscsi_config";

/// 배포된 애플리케이션에서 기대되는 config-key 목록을 만듭니다.
pub fn expected_config_keys<S: AsRef<str>>(applications: &[S]) -> Vec<String> {
    let present = |name: &str| applications.iter().any(|a| a.as_ref() == name);

    let mut keys: Vec<String> = DASHBOARD_KEYS
        .iter()
        .filter(|(app, _)| present(*app))
        .flat_map(|(_, names)| names.iter().map(|n| format!("{DASHBOARD_KEY_PREFIX}{n}")))
        .collect();
    if present("ceph-iscsi") {
        keys.push(ISCSI_KEY.to_owned());
    }
    keys
}

/// 리더 유닛에서 `ceph config-key exists <key>`를 실행합니다.
///
/// 첫 번째로 0이 아닌 종료 코드에서 해당 키를 담아 실패합니다.
pub async fn check_config_keys<M: ModelClient>(
    model: &M,
    application: &str,
    keys: &[String],
) -> Result<(), DashboardError> {
    for key in keys {
        info!(key = %key, "checking config key exists");
        let outcome = model
            .run_on_leader(application, &format!("ceph config-key exists {key}"))
            .await?;
        if !outcome.succeeded() {
            return Err(DashboardError::assertion(
                SCENARIO,
                format!(
                    "config key '{key}' missing on {} (exit code {}): {}",
                    outcome.unit,
                    outcome.code,
                    outcome.stderr.trim()
                ),
            ));
        }
    }
    Ok(())
}

/// 모델의 애플리케이션 목록에서 키를 도출해 모두 확인합니다.
pub async fn check_expected_keys<M: ModelClient>(
    model: &M,
    application: &str,
) -> Result<Vec<String>, DashboardError> {
    let applications = model.application_names().await?;
    let keys = expected_config_keys(applications.as_slice());
    check_config_keys(model, application, &keys).await?;
    Ok(keys)
}
