//! 외부 가격 소스.

mod yahoo;

pub use yahoo::YahooPriceSource;

use async_trait::async_trait;

use folio_core::{AggregationFrequency, DateRange, Instrument, PriceSample};

use crate::Result;

/// 누락 구간을 채우기 위한 과거 가격 조회 인터페이스.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 로그에 사용할 소스 이름.
    fn name(&self) -> &str;

    /// 폐구간 `range`의 종가 샘플을 `granularity` 해상도로 조회합니다.
    ///
    /// 결과는 시각 오름차순이며 범위 밖의 샘플은 포함하지 않습니다.
    async fn fetch(
        &self,
        instrument: &Instrument,
        range: DateRange,
        granularity: AggregationFrequency,
    ) -> Result<Vec<PriceSample>>;
}
