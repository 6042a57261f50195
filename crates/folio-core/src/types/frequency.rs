//! 차트 집계 주기 정의.
//!
//! 각 주기는 고정된 명목 기간(nominal duration)에 대응합니다.
//! 월/연은 달력과 무관한 근사값(30일, 365일)입니다.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 차트 샘플링 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationFrequency {
    /// 5분
    FiveMinutes,
    /// 1시간
    Hour,
    /// 1일
    Day,
    /// 1주
    Week,
    /// 1개월 (30일)
    Month,
    /// 1년 (365일)
    Year,
}

impl AggregationFrequency {
    /// 모든 주기 (짧은 것부터).
    pub const ALL: [AggregationFrequency; 6] = [
        AggregationFrequency::FiveMinutes,
        AggregationFrequency::Hour,
        AggregationFrequency::Day,
        AggregationFrequency::Week,
        AggregationFrequency::Month,
        AggregationFrequency::Year,
    ];

    /// 이 주기의 명목 기간을 반환합니다.
    pub fn nominal_duration(&self) -> Duration {
        match self {
            AggregationFrequency::FiveMinutes => Duration::minutes(5),
            AggregationFrequency::Hour => Duration::hours(1),
            AggregationFrequency::Day => Duration::days(1),
            AggregationFrequency::Week => Duration::weeks(1),
            AggregationFrequency::Month => Duration::days(30),
            AggregationFrequency::Year => Duration::days(365),
        }
    }

    /// 이 주기의 초 단위 값을 반환합니다.
    pub fn as_secs(&self) -> i64 {
        self.nominal_duration().num_seconds()
    }

    /// 주어진 간격을 덮을 수 있는 가장 긴 주기를 반환합니다.
    ///
    /// 가격 소스에서 누락 구간을 조회할 때 요청 해상도를 결정하는 데 사용합니다.
    /// 간격이 5분보다 짧으면 5분을 반환합니다.
    pub fn finest_covering(interval: Duration) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|f| f.nominal_duration() <= interval)
            .unwrap_or(AggregationFrequency::FiveMinutes)
    }

    /// 짧은 코드 문자열 ("5m", "1h", "1d", "1w", "1M", "1y").
    pub fn code(&self) -> &'static str {
        match self {
            AggregationFrequency::FiveMinutes => "5m",
            AggregationFrequency::Hour => "1h",
            AggregationFrequency::Day => "1d",
            AggregationFrequency::Week => "1w",
            AggregationFrequency::Month => "1M",
            AggregationFrequency::Year => "1y",
        }
    }
}

impl fmt::Display for AggregationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AggregationFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(AggregationFrequency::FiveMinutes),
            "1h" => Ok(AggregationFrequency::Hour),
            "1d" => Ok(AggregationFrequency::Day),
            "1w" => Ok(AggregationFrequency::Week),
            "1M" => Ok(AggregationFrequency::Month),
            "1y" => Ok(AggregationFrequency::Year),
            _ => Err(format!("Invalid aggregation frequency: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_duration() {
        assert_eq!(AggregationFrequency::FiveMinutes.as_secs(), 300);
        assert_eq!(AggregationFrequency::Hour.as_secs(), 3600);
        assert_eq!(AggregationFrequency::Day.as_secs(), 86400);
        assert_eq!(AggregationFrequency::Month.as_secs(), 30 * 86400);
    }

    #[test]
    fn test_code_round_trip() {
        for frequency in AggregationFrequency::ALL {
            assert_eq!(frequency.code().parse::<AggregationFrequency>(), Ok(frequency));
        }
        assert!("2h".parse::<AggregationFrequency>().is_err());
    }

    #[test]
    fn test_finest_covering() {
        assert_eq!(
            AggregationFrequency::finest_covering(Duration::minutes(5)),
            AggregationFrequency::FiveMinutes
        );
        assert_eq!(
            AggregationFrequency::finest_covering(Duration::hours(3)),
            AggregationFrequency::Hour
        );
        assert_eq!(
            AggregationFrequency::finest_covering(Duration::days(1)),
            AggregationFrequency::Day
        );
        assert_eq!(
            AggregationFrequency::finest_covering(Duration::seconds(30)),
            AggregationFrequency::FiveMinutes
        );
    }
}
