//! 주식 분할 재적용 모듈.
//!
//! 처리 대기 중인 분할(`NotProcessed`, `RollbackRequested`)을 찾아 분할 시점 이전의
//! 가격과 거래를 조정합니다. 조정된 데이터와 상태 전이는 하나의 커밋으로 기록되므로,
//! 실패한 분할은 아무것도 바뀌지 않은 채 다음 실행에서 다시 처리됩니다.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::Instrument as _;

use folio_core::{
    adjust_ledger, adjust_price_series, valuation_span, DateRange, PriceSeries, SplitAdjustment,
    SplitDirection, SplitProcessingState, StockSplit,
};

use crate::store::{PortfolioStore, SplitCommit};
use crate::{CollectionStats, Result};

/// 처리 대기 중인 모든 분할을 재적용합니다.
pub async fn replay_splits(store: &dyn PortfolioStore) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!("분할 재적용 시작");

    let splits = store.list_splits().await?;

    for mut split in splits {
        stats.total += 1;

        let Some((direction, next)) = split.state.pending_action() else {
            stats.skipped += 1;
            tracing::debug!(split = %split.id, state = %split.state, "처리할 상태 아님");
            continue;
        };

        let span = valuation_span!("split_replay", split.instrument_id, split.id);
        let result = replay_split(store, &mut split, direction, next)
            .instrument(span)
            .await;

        match result {
            Ok(adjusted) => {
                stats.success += 1;
                stats.adjusted_records += adjusted.prices + adjusted.transactions;
                tracing::info!(
                    split = %split.id,
                    ratio = %split.ratio,
                    direction = ?direction,
                    prices = adjusted.prices,
                    transactions = adjusted.transactions,
                    state = %split.state,
                    "분할 조정 완료"
                );
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(split = %split.id, error = %e, "분할 조정 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 분할 하나를 주어진 방향으로 조정하고 상태를 `next`로 전이합니다.
pub async fn replay_split(
    store: &dyn PortfolioStore,
    split: &mut StockSplit,
    direction: SplitDirection,
    next: SplitProcessingState,
) -> Result<SplitAdjustment> {
    // 전이가 불가능한 분할은 데이터를 건드리지 않는다
    let mut target = split.clone();
    target.transition(next)?;

    let mut adjusted = SplitAdjustment::default();

    let history = DateRange::new(DateTime::<Utc>::MIN_UTC, split.effective_at)?;
    let samples = store.load_prices(split.instrument_id, history).await?;
    let mut series = PriceSeries::from_samples(samples);
    adjusted.prices = adjust_price_series(&mut series, split, direction);

    let mut positions = store.list_positions(split.instrument_id).await?;
    for position in &mut positions {
        adjusted.transactions += adjust_ledger(&mut position.transactions, split, direction);
    }

    store
        .commit_split_adjustment(SplitCommit {
            split_id: split.id,
            instrument_id: split.instrument_id,
            expected: split.state,
            next,
            prices: series.as_slice().to_vec(),
            positions,
        })
        .await?;
    *split = target;

    Ok(adjusted)
}
