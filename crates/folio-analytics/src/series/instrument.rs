use serde::{Deserialize, Serialize};

use folio_core::{DateRange, Price, PriceSample};

use super::cursor::PriceCursor;

/// 종목 버킷 스냅샷.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    /// 처음 관측된 가격
    pub seed_price: Price,
    /// 버킷 시작 시점의 가격 (없으면 처음 관측된 가격)
    pub price_at_start: Price,
    /// 버킷 끝 시점의 가격
    pub price_at_end: Price,
}

/// 종목 가격 시계열용 생성기.
#[derive(Debug, Clone)]
pub struct InstrumentPointGenerator<'a> {
    prices: PriceCursor<'a>,
}

impl<'a> InstrumentPointGenerator<'a> {
    pub fn new(samples: &'a [PriceSample]) -> Self {
        Self {
            prices: PriceCursor::new(samples),
        }
    }

    /// 다음 버킷의 스냅샷. 아직 가격이 하나도 없으면 `None`.
    pub fn snapshot(&mut self, bucket: &DateRange) -> Option<InstrumentSnapshot> {
        let start = self.prices.advance_to(bucket.from());
        let end = self.prices.advance_to(bucket.to())?;
        let seed = self.prices.seed()?;
        Some(InstrumentSnapshot {
            seed_price: seed,
            price_at_start: start.unwrap_or(seed),
            price_at_end: end,
        })
    }

    /// 모든 버킷을 순서대로 처리합니다.
    pub fn generate(&mut self, buckets: &[DateRange]) -> Vec<Option<InstrumentSnapshot>> {
        buckets.iter().map(|bucket| self.snapshot(bucket)).collect()
    }
}
