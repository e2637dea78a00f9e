//! CA 인증서 확보
//!
//! 설정에 로컬 `ca_cert` 경로가 있으면 그대로 사용하고, 없으면 첫 번째
//! 대시보드 유닛에서 `remote_ca_cert`를 임시 디렉터리로 복사합니다.
//! 복사 실패는 치명적입니다. TLS 검증을 건너뛰는 경로는 없습니다.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::info;

use dashprobe_core::config::DashboardConfig;
use dashprobe_model::ModelClient;

use crate::error::DashboardError;

const PEM_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// 확보된 CA 인증서
///
/// 유닛에서 복사한 경우 임시 디렉터리를 소유하며, drop 시 삭제됩니다.
#[derive(Debug)]
pub struct CaCertificate {
    path: PathBuf,
    pem: Vec<u8>,
    _dir: Option<TempDir>,
}

impl CaCertificate {
    /// 설정에 따라 인증서를 확보합니다.
    pub async fn resolve<M: ModelClient>(
        model: &M,
        config: &DashboardConfig,
    ) -> Result<Self, DashboardError> {
        if !config.ca_cert.is_empty() {
            info!(path = %config.ca_cert, "using local CA certificate");
            return Self::from_path(&config.ca_cert).await;
        }
        Self::fetch_from_unit(model, &config.application, &config.remote_ca_cert).await
    }

    /// 로컬 파일에서 인증서를 읽습니다.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let pem = tokio::fs::read(path)
            .await
            .map_err(|e| certificate_error(path, e.to_string()))?;
        Self::checked(path.to_path_buf(), pem, None)
    }

    /// 애플리케이션의 첫 번째 유닛에서 인증서를 복사합니다.
    pub async fn fetch_from_unit<M: ModelClient>(
        model: &M,
        application: &str,
        remote_path: &str,
    ) -> Result<Self, DashboardError> {
        let units = model.units(application).await?;
        let unit = units.first().ok_or_else(|| DashboardError::Certificate {
            path: remote_path.to_owned(),
            reason: format!("application '{application}' has no units to copy from"),
        })?;

        let dir = tempfile::tempdir()?;
        let file_name = Path::new(remote_path)
            .file_name()
            .map_or_else(|| "ca.crt".into(), ToOwned::to_owned);
        let local = dir.path().join(file_name);

        model
            .scp_from_unit(unit, remote_path, &local)
            .await
            .map_err(|e| certificate_error(Path::new(remote_path), format!("copy from {unit}: {e}")))?;
        info!(unit = %unit, remote = remote_path, local = %local.display(), "fetched CA certificate");

        let pem = tokio::fs::read(&local)
            .await
            .map_err(|e| certificate_error(&local, e.to_string()))?;
        Self::checked(local, pem, Some(dir))
    }

    fn checked(path: PathBuf, pem: Vec<u8>, dir: Option<TempDir>) -> Result<Self, DashboardError> {
        if !String::from_utf8_lossy(&pem).contains(PEM_MARKER) {
            return Err(certificate_error(&path, "not a PEM certificate".to_owned()));
        }
        Ok(Self {
            path,
            pem,
            _dir: dir,
        })
    }

    /// 인증서 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PEM 바이트
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }

    /// PEM 텍스트
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.pem).into_owned()
    }
}

fn certificate_error(path: &Path, reason: String) -> DashboardError {
    DashboardError::Certificate {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashprobe_model::MockModelClient;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    #[tokio::test]
    async fn local_path_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.crt");
        std::fs::write(&path, PEM).unwrap();

        let config = DashboardConfig {
            ca_cert: path.display().to_string(),
            ..Default::default()
        };
        let cert = CaCertificate::resolve(&MockModelClient::new(), &config)
            .await
            .unwrap();
        assert_eq!(cert.path(), path);
        assert_eq!(cert.text(), PEM);
    }

    #[tokio::test]
    async fn missing_local_path_fails() {
        let config = DashboardConfig {
            ca_cert: "/nonexistent/ca.crt".to_owned(),
            ..Default::default()
        };
        let err = CaCertificate::resolve(&MockModelClient::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Certificate { .. }));
    }

    #[tokio::test]
    async fn non_pem_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.crt");
        std::fs::write(&path, "garbage").unwrap();
        let err = CaCertificate::from_path(&path).await.unwrap_err();
        assert!(err.to_string().contains("not a PEM certificate"));
    }

    #[tokio::test]
    async fn remote_certificate_lives_in_owned_temp_dir() {
        let config = DashboardConfig::default();
        let model = MockModelClient::new()
            .with_units("ceph-dashboard", ["10.0.0.1", "10.0.0.2"])
            .with_file("ceph-dashboard/0", &config.remote_ca_cert, PEM);

        let cert = CaCertificate::resolve(&model, &config).await.unwrap();
        let path = cert.path().to_path_buf();
        assert!(path.exists());
        assert!(path.ends_with("vault_ca_cert_dashboard.crt"));
        assert_eq!(cert.pem(), PEM.as_bytes());

        drop(cert);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_copy_is_fatal() {
        let model = MockModelClient::new().with_units("ceph-dashboard", ["10.0.0.1"]);
        let err = CaCertificate::resolve(&model, &DashboardConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Certificate { .. }));
    }

    #[tokio::test]
    async fn application_without_units_fails() {
        let model = MockModelClient::new().with_applications(["ceph-dashboard"]);
        let err = CaCertificate::resolve(&model, &DashboardConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no units"));
    }
}
