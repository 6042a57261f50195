//! 포트폴리오 저장소 추상화.
//!
//! 백그라운드 작업은 이 트레이트만 바라보며, 기본 구현은 JSON 스냅샷 파일을
//! 메모리에 올려 두는 [`InMemoryStore`]입니다.

mod memory;

pub use memory::{InMemoryStore, StoreSnapshot};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use folio_core::{
    DateRange, Instrument, Position, PriceSample, PriceTracking, SplitProcessingState, StockSplit,
};

use crate::Result;

/// 분할 조정 결과를 한 번에 기록하기 위한 변경 묶음.
///
/// 조정된 가격과 포지션, 분할 상태 전이가 모두 반영되거나 하나도 반영되지 않아야
/// 합니다. 일부만 기록되면 다음 실행에서 같은 분할이 다시 적용됩니다.
#[derive(Debug, Clone)]
pub struct SplitCommit {
    pub split_id: Uuid,
    pub instrument_id: Uuid,
    /// 조정을 시작할 때 읽은 분할 상태
    pub expected: SplitProcessingState,
    /// 전이할 분할 상태
    pub next: SplitProcessingState,
    /// 조정된 가격 샘플 (같은 시각의 기존 샘플을 교체)
    pub prices: Vec<PriceSample>,
    /// 조정된 포지션 (같은 ID를 교체)
    pub positions: Vec<Position>,
}

/// 종목, 가격, 포지션, 분할 기록 저장소.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// 등록된 모든 종목.
    async fn list_instruments(&self) -> Result<Vec<Instrument>>;

    /// 폐구간 `range`에 속한 가격 샘플 (시각 오름차순).
    async fn load_prices(&self, instrument_id: Uuid, range: DateRange) -> Result<Vec<PriceSample>>;

    /// `at` 이전 또는 같은 시각의 마지막 가격 샘플.
    async fn price_at(&self, instrument_id: Uuid, at: DateTime<Utc>)
        -> Result<Option<PriceSample>>;

    /// 가격 샘플을 저장합니다. 같은 시각의 샘플은 교체됩니다.
    ///
    /// 새로 삽입된 샘플 수를 반환합니다.
    async fn upsert_prices(&self, instrument_id: Uuid, samples: Vec<PriceSample>) -> Result<usize>;

    /// 종목의 가격 추적 상태를 갱신합니다.
    async fn update_price_tracking(&self, instrument_id: Uuid, tracking: PriceTracking)
        -> Result<()>;

    /// 종목에 대한 모든 포지션.
    async fn list_positions(&self, instrument_id: Uuid) -> Result<Vec<Position>>;

    /// 모든 분할 기록 (`effective_at` 오름차순).
    async fn list_splits(&self) -> Result<Vec<StockSplit>>;

    /// 분할 처리 상태를 갱신합니다 (되돌리기 요청 등 데이터 변경이 없는 전이).
    async fn update_split_state(&self, split_id: Uuid, state: SplitProcessingState) -> Result<()>;

    /// 분할 조정 결과와 상태 전이를 원자적으로 기록합니다.
    ///
    /// 분할의 현재 상태가 `commit.expected`와 다르면 아무것도 쓰지 않고 실패합니다.
    async fn commit_split_adjustment(&self, commit: SplitCommit) -> Result<()>;
}
