//! TLS verification against a local HTTPS listener.
//!
//! A throwaway CA signs a leaf certificate for `127.0.0.1`. The dashboard
//! client must trust the listener only when that CA is supplied.

mod common;

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, PKCS_ECDSA_P256_SHA256,
    SanType,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tracing_subscriber::fmt::MakeWriter;

use dashprobe_core::config::DashprobeConfig;
use dashprobe_dashboard::{
    DashboardError, DashboardHttp, RetryPolicy, SuiteContext, find_active_endpoint,
};
use dashprobe_model::MockModelClient;

use common::APP;

struct Pki {
    ca_pem: String,
    leaf_der: Vec<u8>,
    leaf_key_der: Vec<u8>,
}

fn authority(common_name: &str) -> Certificate {
    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.alg = &PKCS_ECDSA_P256_SHA256;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    Certificate::from_params(params).expect("CA certificate")
}

fn pki() -> Pki {
    let ca = authority("dashprobe test CA");

    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, "ceph-dashboard");
    params.alg = &PKCS_ECDSA_P256_SHA256;
    params.subject_alt_names = vec![SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST))];
    let leaf = Certificate::from_params(params).expect("leaf certificate");

    Pki {
        ca_pem: ca.serialize_pem().expect("CA pem"),
        leaf_der: leaf.serialize_der_with_signer(&ca).expect("signed leaf"),
        leaf_key_der: leaf.serialize_private_key_der(),
    }
}

/// Serves `200 ok` over TLS on `127.0.0.1` and returns the port.
async fn serve(pki: &Pki) -> u16 {
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(pki.leaf_key_der.clone()));
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![CertificateDer::from(pki.leaf_der.clone())], key)
        .expect("server config");
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Untrusted clients abort the handshake.
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match tls.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = tls
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                    .await;
                let _ = tls.shutdown().await;
            });
        }
    });
    port
}

fn https_config(port: u16) -> DashprobeConfig {
    let mut config = DashprobeConfig::default();
    config.dashboard.port = port;
    config.retry.max_attempts = 1;
    config
}

fn model_with_ca(ca_pem: &str) -> MockModelClient {
    let remote = DashprobeConfig::default().dashboard.remote_ca_cert;
    MockModelClient::new()
        .with_units(APP, ["127.0.0.1"])
        .with_file(&format!("{APP}/0"), &remote, ca_pem)
}

#[tokio::test]
async fn trusted_ca_bundle_verifies_listener() {
    let pki = pki();
    let port = serve(&pki).await;

    let http = DashboardHttp::new(Some(pki.ca_pem.as_bytes()), None, RetryPolicy::immediate(1))
        .expect("http client");
    let response = http
        .get(&format!("https://127.0.0.1:{port}/"), false)
        .await
        .expect("verified request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn missing_ca_bundle_is_a_transport_error() {
    let pki = pki();
    let port = serve(&pki).await;

    let http = DashboardHttp::new(None, None, RetryPolicy::immediate(1)).expect("http client");
    let err = http
        .get(&format!("https://127.0.0.1:{port}/"), false)
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Http { .. }), "got {err:?}");
}

#[tokio::test]
async fn unrelated_ca_bundle_is_rejected() {
    let pki = pki();
    let port = serve(&pki).await;
    let other = authority("unrelated CA")
        .serialize_pem()
        .expect("unrelated pem");

    let http = DashboardHttp::new(Some(other.as_bytes()), None, RetryPolicy::immediate(1))
        .expect("http client");
    let err = http
        .get(&format!("https://127.0.0.1:{port}/"), false)
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Http { .. }), "got {err:?}");
}

#[tokio::test]
async fn context_built_from_unit_ca_reaches_https_unit() {
    // Given: a unit serving TLS with the CA stored on the unit
    let pki = pki();
    let port = serve(&pki).await;
    let model = model_with_ca(&pki.ca_pem);

    // When: building the context the way the suite does
    let ctx = SuiteContext::build(model, https_config(port))
        .await
        .expect("context");

    // Then: the fetched CA is trusted for the active unit
    assert_eq!(ctx.ca().text(), pki.ca_pem);
    let endpoint = find_active_endpoint(&ctx).await.expect("endpoint lookup");
    assert_eq!(endpoint, Some(format!("https://127.0.0.1:{port}")));
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

async fn build_and_capture(scheme: &str) -> String {
    let pki = pki();
    let mut config = https_config(8443);
    config.dashboard.scheme = scheme.to_owned();

    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    SuiteContext::build(model_with_ca(&pki.ca_pem), config)
        .await
        .expect("context");
    captured.contents()
}

#[tokio::test]
async fn plain_http_scheme_logs_warning() {
    let logs = build_and_capture("http").await;
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("not TLS-verified"), "logs: {logs}");
}

#[tokio::test]
async fn https_scheme_builds_without_warning() {
    let logs = build_and_capture("https").await;
    assert!(!logs.contains("not TLS-verified"), "logs: {logs}");
}
