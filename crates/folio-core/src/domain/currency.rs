//! 통화 변환 인터페이스와 시점별 환율 테이블.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FolioError, FolioResult};

/// 통화 변환기.
///
/// 차트 포인트마다 대상 통화가 종목 통화와 다를 때 호출됩니다.
/// 환율이 없으면 기본값 대신 `MissingExchangeRate`를 반환해야 합니다.
pub trait CurrencyConverter: Send + Sync {
    /// `at` 시점의 환율로 금액을 변환합니다.
    fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        at: DateTime<Utc>,
    ) -> FolioResult<Decimal>;
}

/// 같은 통화 사이의 변환만 허용하는 변환기.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl CurrencyConverter for IdentityConverter {
    fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        at: DateTime<Utc>,
    ) -> FolioResult<Decimal> {
        if from.eq_ignore_ascii_case(to) {
            Ok(amount)
        } else {
            Err(FolioError::MissingExchangeRate {
                from: from.to_uppercase(),
                to: to.to_uppercase(),
                at,
            })
        }
    }
}

/// 환율 관측치.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSample {
    pub time: DateTime<Utc>,
    /// 1 단위 기준 통화당 견적 통화
    pub rate: Decimal,
}

/// 통화쌍별 환율 시계열.
///
/// `at` 이전 또는 같은 시각의 가장 최근 환율을 사용합니다.
/// 역방향 쌍은 등록된 환율의 역수로 계산합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<String, Vec<RateSample>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(from: &str, to: &str) -> String {
        format!("{}/{}", from.to_uppercase(), to.to_uppercase())
    }

    /// 환율을 등록합니다. 같은 시각의 기존 값은 교체됩니다.
    pub fn insert(&mut self, from: &str, to: &str, time: DateTime<Utc>, rate: Decimal) {
        let samples = self.rates.entry(Self::key(from, to)).or_default();
        let sample = RateSample { time, rate };
        match samples.binary_search_by_key(&time, |s| s.time) {
            Ok(idx) => samples[idx] = sample,
            Err(idx) => samples.insert(idx, sample),
        }
    }

    /// 빌더 스타일 등록.
    pub fn with_rate(mut self, from: &str, to: &str, time: DateTime<Utc>, rate: Decimal) -> Self {
        self.insert(from, to, time, rate);
        self
    }

    fn direct_rate(&self, from: &str, to: &str, at: DateTime<Utc>) -> Option<Decimal> {
        let samples = self.rates.get(&Self::key(from, to))?;
        let idx = samples.partition_point(|s| s.time <= at);
        idx.checked_sub(1).map(|i| samples[i].rate)
    }

    /// `at` 시점의 `from → to` 환율.
    pub fn rate_at(&self, from: &str, to: &str, at: DateTime<Utc>) -> Option<Decimal> {
        if from.eq_ignore_ascii_case(to) {
            return Some(Decimal::ONE);
        }
        if let Some(rate) = self.direct_rate(from, to, at) {
            return Some(rate);
        }
        self.direct_rate(to, from, at)
            .filter(|rate| !rate.is_zero())
            .map(|rate| Decimal::ONE / rate)
    }
}

impl CurrencyConverter for RateTable {
    fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        at: DateTime<Utc>,
    ) -> FolioResult<Decimal> {
        self.rate_at(from, to, at)
            .map(|rate| amount * rate)
            .ok_or_else(|| FolioError::MissingExchangeRate {
                from: from.to_uppercase(),
                to: to.to_uppercase(),
                at,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn table() -> RateTable {
        RateTable::new()
            .with_rate("USD", "KRW", day(0), dec!(1300))
            .with_rate("USD", "KRW", day(5), dec!(1250))
    }

    #[test]
    fn test_latest_rate_at_or_before() {
        let rates = table();
        assert_eq!(rates.rate_at("USD", "KRW", day(0)), Some(dec!(1300)));
        assert_eq!(rates.rate_at("usd", "krw", day(4)), Some(dec!(1300)));
        assert_eq!(rates.rate_at("USD", "KRW", day(9)), Some(dec!(1250)));
        assert_eq!(rates.rate_at("USD", "KRW", day(-1)), None);
    }

    #[test]
    fn test_inverse_and_identity() {
        let rates = table();
        assert_eq!(rates.rate_at("KRW", "USD", day(5)), Some(dec!(1) / dec!(1250)));
        assert_eq!(rates.rate_at("EUR", "eur", day(5)), Some(Decimal::ONE));
    }

    #[test]
    fn test_missing_rate_is_error() {
        let rates = table();
        assert_eq!(
            rates.convert(dec!(2), "USD", "KRW", day(6)).unwrap(),
            dec!(2500)
        );

        let err = rates.convert(dec!(1), "USD", "EUR", day(6)).unwrap_err();
        assert!(matches!(err, FolioError::MissingExchangeRate { .. }));

        assert!(IdentityConverter.convert(dec!(1), "USD", "EUR", day(0)).is_err());
    }
}
