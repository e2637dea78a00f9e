//! 릴리스 페어 — `<series>_<codename>` 순서 비교
//!
//! 스토리지 클러스터 릴리스는 Ubuntu 시리즈와 OpenStack 코드네임의 조합으로
//! 표현합니다 (예: `focal_yoga`). 순서는 [`RELEASE_PAIRS`] 테이블의 위치로
//! 결정되며, 시리즈 알파벳 순서나 코드네임 순서와는 다릅니다.
//!
//! # 사용 예시
//! ```
//! use dashprobe_core::release::Release;
//!
//! let deployed = Release::from_source("cloud:focal-xena", "focal").unwrap();
//! let minimum: Release = "focal_yoga".parse().unwrap();
//! assert!(deployed < minimum);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReleaseError;

/// 알려진 릴리스 페어 (오래된 것부터)
pub const RELEASE_PAIRS: &[(&str, &str)] = &[
    ("trusty", "icehouse"),
    ("trusty", "kilo"),
    ("trusty", "liberty"),
    ("trusty", "mitaka"),
    ("xenial", "mitaka"),
    ("xenial", "newton"),
    ("yakkety", "newton"),
    ("xenial", "ocata"),
    ("zesty", "ocata"),
    ("xenial", "pike"),
    ("artful", "pike"),
    ("xenial", "queens"),
    ("bionic", "queens"),
    ("bionic", "rocky"),
    ("cosmic", "rocky"),
    ("bionic", "stein"),
    ("disco", "stein"),
    ("bionic", "train"),
    ("eoan", "train"),
    ("bionic", "ussuri"),
    ("focal", "ussuri"),
    ("focal", "victoria"),
    ("groovy", "victoria"),
    ("focal", "wallaby"),
    ("hirsute", "wallaby"),
    ("focal", "xena"),
    ("impish", "xena"),
    ("focal", "yoga"),
    ("jammy", "yoga"),
    ("jammy", "zed"),
    ("kinetic", "zed"),
    ("jammy", "antelope"),
    ("lunar", "antelope"),
    ("jammy", "bobcat"),
    ("mantic", "bobcat"),
    ("jammy", "caracal"),
    ("noble", "caracal"),
];

/// 시리즈별 배포판 기본 코드네임 (`source = distro`)
const DISTRO_DEFAULTS: &[(&str, &str)] = &[
    ("trusty", "icehouse"),
    ("xenial", "mitaka"),
    ("yakkety", "newton"),
    ("zesty", "ocata"),
    ("artful", "pike"),
    ("bionic", "queens"),
    ("cosmic", "rocky"),
    ("disco", "stein"),
    ("eoan", "train"),
    ("focal", "ussuri"),
    ("groovy", "victoria"),
    ("hirsute", "wallaby"),
    ("impish", "xena"),
    ("jammy", "yoga"),
    ("kinetic", "zed"),
    ("lunar", "antelope"),
    ("mantic", "bobcat"),
    ("noble", "caracal"),
];

/// Ubuntu 버전 채널과 시리즈 매핑 (juju 3 `base.channel`)
const CHANNEL_SERIES: &[(&str, &str)] = &[
    ("14.04", "trusty"),
    ("16.04", "xenial"),
    ("16.10", "yakkety"),
    ("17.04", "zesty"),
    ("17.10", "artful"),
    ("18.04", "bionic"),
    ("18.10", "cosmic"),
    ("19.04", "disco"),
    ("19.10", "eoan"),
    ("20.04", "focal"),
    ("20.10", "groovy"),
    ("21.04", "hirsute"),
    ("21.10", "impish"),
    ("22.04", "jammy"),
    ("22.10", "kinetic"),
    ("23.04", "lunar"),
    ("23.10", "mantic"),
    ("24.04", "noble"),
];

/// 릴리스 페어
///
/// `Ord` 구현은 [`RELEASE_PAIRS`]의 인덱스를 비교합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Release {
    index: usize,
}

impl Release {
    /// 시리즈와 코드네임으로 릴리스를 찾습니다.
    pub fn new(series: &str, codename: &str) -> Result<Self, ReleaseError> {
        let series = series.trim().to_lowercase();
        let codename = codename.trim().to_lowercase();
        RELEASE_PAIRS
            .iter()
            .position(|(s, c)| *s == series && *c == codename)
            .map(|index| Self { index })
            .ok_or_else(|| ReleaseError::UnknownPair(format!("{series}_{codename}")))
    }

    /// 애플리케이션의 `source` 설정값과 시리즈로 릴리스를 결정합니다.
    ///
    /// - `distro` 또는 빈 문자열: 시리즈의 배포판 기본 코드네임
    /// - `cloud:<series>-<codename>[/pocket]`: 지정된 페어
    /// - 그 외 (PPA, 직접 지정 URL 등): [`ReleaseError::UnsupportedSource`]
    pub fn from_source(source: &str, series: &str) -> Result<Self, ReleaseError> {
        let source = source.trim();
        if source.is_empty() || source == "distro" || source.starts_with("distro-") {
            return Self::distro_default(series);
        }

        let Some(cloud) = source.strip_prefix("cloud:") else {
            return Err(ReleaseError::UnsupportedSource(source.to_owned()));
        };
        let pair = cloud.split('/').next().unwrap_or(cloud);
        let Some((cloud_series, codename)) = pair.split_once('-') else {
            return Err(ReleaseError::UnsupportedSource(source.to_owned()));
        };
        Self::new(cloud_series, codename)
    }

    /// 시리즈의 배포판 기본 릴리스를 반환합니다.
    pub fn distro_default(series: &str) -> Result<Self, ReleaseError> {
        let series = series.trim().to_lowercase();
        let codename = DISTRO_DEFAULTS
            .iter()
            .find(|(s, _)| *s == series)
            .map(|(_, c)| *c)
            .ok_or_else(|| ReleaseError::UnknownSeries(series.clone()))?;
        Self::new(&series, codename)
    }

    /// Ubuntu 시리즈명
    pub fn series(&self) -> &'static str {
        RELEASE_PAIRS[self.index].0
    }

    /// OpenStack 코드네임
    pub fn codename(&self) -> &'static str {
        RELEASE_PAIRS[self.index].1
    }
}

/// 버전 채널(`22.04`, `22.04/stable`)을 시리즈명으로 변환합니다.
///
/// 이미 시리즈명이면 그대로 반환합니다.
pub fn series_from_channel(channel: &str) -> Result<String, ReleaseError> {
    let channel = channel.trim();
    let version = channel.split('/').next().unwrap_or(channel);
    if let Some((_, series)) = CHANNEL_SERIES.iter().find(|(v, _)| *v == version) {
        return Ok((*series).to_owned());
    }
    if DISTRO_DEFAULTS.iter().any(|(s, _)| *s == version) {
        return Ok(version.to_owned());
    }
    Err(ReleaseError::UnknownSeries(channel.to_owned()))
}

impl FromStr for Release {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (series, codename) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| ReleaseError::UnknownPair(s.to_owned()))?;
        Self::new(series, codename)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.series(), self.codename())
    }
}

impl Serialize for Release {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Release {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> Release {
        s.parse().unwrap()
    }

    #[test]
    fn parses_known_pair() {
        let release = r("focal_yoga");
        assert_eq!(release.series(), "focal");
        assert_eq!(release.codename(), "yoga");
        assert_eq!(release.to_string(), "focal_yoga");
    }

    #[test]
    fn rejects_unknown_pair() {
        assert!(matches!(
            "focal_zed".parse::<Release>(),
            Err(ReleaseError::UnknownPair(_))
        ));
        assert!("yoga".parse::<Release>().is_err());
    }

    #[test]
    fn ordering_follows_table_not_alphabet() {
        // impish_xena precedes focal_yoga even though 'i' > 'f'.
        assert!(r("impish_xena") < r("focal_yoga"));
        assert!(r("focal_xena") < r("focal_yoga"));
        assert!(r("focal_yoga") < r("jammy_yoga"));
        assert!(r("bionic_ussuri") < r("focal_ussuri"));
    }

    #[test]
    fn interim_series_follow_their_lts_pair() {
        assert!(r("focal_victoria") < r("groovy_victoria"));
        assert!(r("groovy_victoria") < r("focal_wallaby"));
        assert!(r("hirsute_wallaby") < r("focal_xena"));
        assert!(r("focal_xena") < r("impish_xena"));
        assert!(r("xenial_newton") < r("yakkety_newton"));
        assert!(r("yakkety_newton") < r("xenial_ocata"));
        assert!(r("bionic_train") < r("eoan_train"));
        assert!(r("eoan_train") < r("bionic_ussuri"));
    }

    #[test]
    fn interim_releases_resolve_and_gate() {
        let minimum = r("focal_yoga");
        for (source, series) in [
            ("distro", "zesty"),
            ("distro", "artful"),
            ("distro", "cosmic"),
            ("distro", "disco"),
            ("distro", "eoan"),
            ("cloud:groovy-victoria", "groovy"),
        ] {
            let release = Release::from_source(source, series).unwrap();
            assert!(release < minimum, "{release}");
        }
        assert_eq!(series_from_channel("19.10").unwrap(), "eoan");
    }

    #[test]
    fn distro_source_uses_series_default() {
        assert_eq!(Release::from_source("distro", "focal").unwrap(), r("focal_ussuri"));
        assert_eq!(Release::from_source("", "jammy").unwrap(), r("jammy_yoga"));
        assert_eq!(
            Release::from_source("distro-proposed", "noble").unwrap(),
            r("noble_caracal")
        );
    }

    #[test]
    fn cloud_archive_source_is_parsed() {
        assert_eq!(
            Release::from_source("cloud:focal-yoga", "focal").unwrap(),
            r("focal_yoga")
        );
        assert_eq!(
            Release::from_source("cloud:jammy-bobcat/proposed", "jammy").unwrap(),
            r("jammy_bobcat")
        );
    }

    #[test]
    fn unsupported_source_is_rejected() {
        assert!(matches!(
            Release::from_source("ppa:ubuntu-cloud-archive/staging", "focal"),
            Err(ReleaseError::UnsupportedSource(_))
        ));
        assert!(matches!(
            Release::from_source("cloud:focal", "focal"),
            Err(ReleaseError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn channel_maps_to_series() {
        assert_eq!(series_from_channel("22.04").unwrap(), "jammy");
        assert_eq!(series_from_channel("20.04/stable").unwrap(), "focal");
        assert_eq!(series_from_channel("noble").unwrap(), "noble");
        assert!(series_from_channel("99.04").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&r("jammy_zed")).unwrap();
        assert_eq!(json, "\"jammy_zed\"");
        let back: Release = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r("jammy_zed"));
    }
}
