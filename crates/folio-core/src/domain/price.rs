//! 가격 샘플과 종목별 가격 시계열.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// 가격 또는 차트 시계열의 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time: DateTime<Utc>,
    pub value: Decimal,
}

impl TimePoint {
    pub fn new(time: DateTime<Utc>, value: Decimal) -> Self {
        Self { time, value }
    }

    /// 차트 X축 값 (밀리초).
    pub fn timestamp_millis(&self) -> i64 {
        self.time.timestamp_millis()
    }
}

/// 단일 가격 샘플 (가격 >= 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub time: DateTime<Utc>,
    pub price: Price,
}

impl PriceSample {
    pub fn new(time: DateTime<Utc>, price: Price) -> Self {
        Self { time, price }
    }
}

/// 한 종목의 가격 시계열.
///
/// 불변식: 시간 오름차순 정렬이며 같은 타임스탬프에는 샘플이 최대 하나입니다.
/// 시리즈 생성기의 전진 전용 커서가 이 불변식에 의존합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PriceSample>", into = "Vec<PriceSample>")]
pub struct PriceSeries {
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// 임의 순서의 샘플로 시계열을 만듭니다.
    ///
    /// 같은 타임스탬프가 여러 번 나오면 나중 샘플이 남습니다.
    pub fn from_samples(mut samples: Vec<PriceSample>) -> Self {
        // 안정 정렬이므로 같은 시각 안에서는 입력 순서가 유지됨
        samples.sort_by_key(|s| s.time);
        let mut deduped: Vec<PriceSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match deduped.last_mut() {
                Some(last) if last.time == sample.time => *last = sample,
                _ => deduped.push(sample),
            }
        }
        Self { samples: deduped }
    }

    pub fn as_slice(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    /// 샘플을 삽입하거나 같은 시각의 샘플을 교체합니다.
    ///
    /// 새로 삽입되었으면 `true`, 교체되었으면 `false`.
    pub fn upsert(&mut self, sample: PriceSample) -> bool {
        match self.samples.binary_search_by_key(&sample.time, |s| s.time) {
            Ok(idx) => {
                self.samples[idx] = sample;
                false
            }
            Err(idx) => {
                self.samples.insert(idx, sample);
                true
            }
        }
    }

    /// `at` 시점에 유효한 가격 (at 이전 또는 같은 시각의 마지막 샘플).
    pub fn price_at(&self, at: DateTime<Utc>) -> Option<&PriceSample> {
        let idx = self.samples.partition_point(|s| s.time <= at);
        idx.checked_sub(1).map(|i| &self.samples[i])
    }

    /// 폐구간 `[from, to]`에 속한 샘플.
    pub fn range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> &[PriceSample] {
        let start = self.samples.partition_point(|s| s.time < from);
        let end = self.samples.partition_point(|s| s.time <= to);
        if start >= end {
            &[]
        } else {
            &self.samples[start..end]
        }
    }

    /// 모든 샘플 가격에 함수를 적용합니다 (`until` 이전 또는 같은 시각만).
    pub fn map_prices_until<F>(&mut self, until: DateTime<Utc>, mut f: F) -> usize
    where
        F: FnMut(Price) -> Price,
    {
        let end = self.samples.partition_point(|s| s.time <= until);
        for sample in &mut self.samples[..end] {
            sample.price = f(sample.price);
        }
        end
    }
}

impl From<Vec<PriceSample>> for PriceSeries {
    fn from(samples: Vec<PriceSample>) -> Self {
        Self::from_samples(samples)
    }
}

impl From<PriceSeries> for Vec<PriceSample> {
    fn from(series: PriceSeries) -> Self {
        series.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_from_samples_sorts_and_dedups() {
        let series = PriceSeries::from_samples(vec![
            PriceSample::new(t(10), dec!(3)),
            PriceSample::new(t(0), dec!(1)),
            PriceSample::new(t(10), dec!(4)),
            PriceSample::new(t(5), dec!(2)),
        ]);

        let prices: Vec<_> = series.as_slice().iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![dec!(1), dec!(2), dec!(4)]);
    }

    #[test]
    fn test_price_at() {
        let series = PriceSeries::from_samples(vec![
            PriceSample::new(t(0), dec!(1)),
            PriceSample::new(t(10), dec!(2)),
        ]);

        assert!(series.price_at(t(-1)).is_none());
        assert_eq!(series.price_at(t(0)).unwrap().price, dec!(1));
        assert_eq!(series.price_at(t(9)).unwrap().price, dec!(1));
        assert_eq!(series.price_at(t(30)).unwrap().price, dec!(2));
    }

    #[test]
    fn test_upsert_keeps_order() {
        let mut series = PriceSeries::new();
        assert!(series.upsert(PriceSample::new(t(10), dec!(2))));
        assert!(series.upsert(PriceSample::new(t(0), dec!(1))));
        assert!(!series.upsert(PriceSample::new(t(10), dec!(5))));

        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().time, t(0));
        assert_eq!(series.last().unwrap().price, dec!(5));
    }

    #[test]
    fn test_range_is_closed() {
        let series = PriceSeries::from_samples(
            (0..5).map(|i| PriceSample::new(t(i * 5), dec!(1))).collect(),
        );
        assert_eq!(series.range(t(5), t(15)).len(), 3);
        assert!(series.range(t(16), t(19)).is_empty());
    }
}
