//! 대시보드 프로브
//!
//! 여러 대시보드 유닛 중 요청을 직접 처리하는 활성 유닛을 찾습니다.
//! 활성 유닛은 `200 OK`, 나머지는 `303 See Other`로 활성 유닛에 리다이렉트합니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use dashprobe_model::ModelClient;

use crate::context::SuiteContext;
use crate::error::DashboardError;

const SCENARIO: &str = "dashboard_units";

const OK: u16 = 200;
const SEE_OTHER: u16 = 303;

/// 상태 코드별 유닛 주소 분포
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    /// 상태 코드 -> 주소 목록 (유닛 열거 순서)
    pub buckets: BTreeMap<u16, Vec<String>>,
    /// 조사한 유닛 수
    pub unit_count: usize,
}

impl Topology {
    /// `(address, status)` 쌍에서 분포를 만듭니다.
    pub fn from_probes<I, S>(probes: I) -> Self
    where
        I: IntoIterator<Item = (S, u16)>,
        S: Into<String>,
    {
        let mut topology = Self::default();
        for (address, status) in probes {
            topology.buckets.entry(status).or_default().push(address.into());
            topology.unit_count += 1;
        }
        topology
    }

    /// 해당 상태 코드를 응답한 주소
    pub fn addresses(&self, status: u16) -> &[String] {
        self.buckets.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 정확히 하나의 200과 N-1개의 303인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        self.addresses(OK).len() == 1
            && self.addresses(SEE_OTHER).len() == self.unit_count.saturating_sub(1)
    }

    /// 분포를 검증하고, 실패 시 관측된 분포를 담은 메시지를 반환합니다.
    pub fn verify(&self) -> Result<(), String> {
        if self.is_healthy() {
            return Ok(());
        }
        let active = self.addresses(OK).len();
        let reason = if active > 1 {
            format!("{active} units answered 200: {}", self.addresses(OK).join(", "))
        } else if active == 0 {
            "no unit answered 200".to_owned()
        } else {
            format!(
                "expected {} units to answer 303",
                self.unit_count.saturating_sub(1)
            )
        };
        Err(format!("{reason}; observed {self}"))
    }
}

impl fmt::Display for Topology {
    /// `{200: [B], 303: [A, C]}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (status, addresses)) in self.buckets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{status}: [{}]", addresses.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// 모든 유닛에 비인증 GET (리다이렉트 비활성)을 보내 분포를 수집합니다.
pub async fn probe_units<M: ModelClient>(
    ctx: &SuiteContext<M>,
) -> Result<Topology, DashboardError> {
    let units = ctx.model().units(ctx.application()).await?;
    let mut probes = Vec::with_capacity(units.len());
    for unit in &units {
        let address = ctx.model().unit_public_address(unit).await?;
        let url = ctx.unit_url(&address);
        let status = ctx.http().get(&url, false).await?.status().as_u16();
        debug!(unit = %unit, url = %url, status, "probed dashboard unit");
        probes.push((address, status));
    }
    Ok(Topology::from_probes(probes))
}

/// 첫 번째로 `200 OK`를 응답한 유닛의 기본 URL을 반환합니다.
///
/// 여러 유닛이 200을 응답해도 유닛 열거 순서상 첫 번째가 선택됩니다.
/// 그 상황은 [`verify_topology`]가 실패로 보고합니다.
pub async fn find_active_endpoint<M: ModelClient>(
    ctx: &SuiteContext<M>,
) -> Result<Option<String>, DashboardError> {
    let units = ctx.model().units(ctx.application()).await?;
    for unit in &units {
        let address = ctx.model().unit_public_address(unit).await?;
        let url = ctx.unit_url(&address);
        let status = ctx.http().get(&url, false).await?.status().as_u16();
        if status == OK {
            info!(unit = %unit, url = %url, "found active dashboard unit");
            return Ok(Some(url));
        }
        debug!(unit = %unit, status, "dashboard unit is not active");
    }
    Ok(None)
}

/// [`find_active_endpoint`]와 같지만 활성 유닛이 없으면 `scenario` 실패로 처리합니다.
pub async fn require_active_endpoint<M: ModelClient>(
    ctx: &SuiteContext<M>,
    scenario: &str,
) -> Result<String, DashboardError> {
    find_active_endpoint(ctx).await?.ok_or_else(|| {
        DashboardError::assertion(
            scenario,
            format!("no unit of '{}' answered 200", ctx.application()),
        )
    })
}

/// 정확히 하나의 200과 N-1개의 303을 확인합니다.
pub async fn verify_topology<M: ModelClient>(
    ctx: &SuiteContext<M>,
) -> Result<Topology, DashboardError> {
    let topology = probe_units(ctx).await?;
    topology
        .verify()
        .map_err(|message| DashboardError::assertion(SCENARIO, message))?;
    info!(topology = %topology, "dashboard topology verified");
    Ok(topology)
}
