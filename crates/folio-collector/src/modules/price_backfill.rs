//! 가격 보충 모듈.
//!
//! 종목별로 점검 기간의 누락 구간을 찾고, 가격 소스에서 조회한 뒤에도 남은
//! 구간은 직전 가격으로 채웁니다. 한 종목의 실패는 다른 종목에 영향을 주지 않습니다.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::Instrument as _;

use folio_core::{
    valuation_span, AggregationFrequency, DateRange, Instrument, PriceSeries, PriceTracking,
};

use crate::gaps::{carry_forward, detect_series_gaps, IntervalPolicy, TieredIntervalPolicy};
use crate::source::PriceSource;
use crate::store::PortfolioStore;
use crate::{CollectionStats, CollectorConfig, Result};

/// 종목 단위 처리 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillOutcome {
    /// 처음 탐지된 누락 구간 수
    pub gaps: usize,
    /// 가격 소스에서 받아 저장한 샘플 수
    pub fetched: usize,
    /// 직전 가격으로 채운 샘플 수
    pub carried: usize,
    /// 가격 소스 요청 여부
    pub requested_remote: bool,
}

impl BackfillOutcome {
    pub fn inserted(&self) -> usize {
        self.fetched + self.carried
    }
}

/// 모든 (또는 지정한) 종목의 누락 가격을 보충합니다.
///
/// `symbols`는 쉼표로 구분한 종목 심볼 목록입니다.
pub async fn backfill_prices(
    store: &dyn PortfolioStore,
    source: Option<&dyn PriceSource>,
    config: &CollectorConfig,
    symbols: Option<String>,
    now: DateTime<Utc>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!("가격 보충 시작");

    let instruments = select_instruments(store.list_instruments().await?, symbols.as_deref());
    if instruments.is_empty() {
        tracing::warn!("보충할 종목이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let policy = TieredIntervalPolicy::from_config(&config.backfill.tiers);
    let window = DateRange::new(now - config.backfill.lookback(), now)?;

    for (idx, instrument) in instruments.iter().enumerate() {
        stats.total += 1;

        tracing::debug!(
            symbol = %instrument.symbol,
            progress = format!("{}/{}", idx + 1, instruments.len()),
            "점검 시작"
        );

        let span = valuation_span!("backfill", instrument.symbol);
        let result = backfill_instrument(store, source, &policy, instrument, window, now)
            .instrument(span)
            .await;
        let requested_remote = matches!(&result, Ok(outcome) if outcome.requested_remote);

        match result {
            Ok(outcome) if outcome.gaps == 0 => {
                stats.skipped += 1;
                tracing::debug!(symbol = %instrument.symbol, "누락 구간 없음");
            }
            Ok(outcome) if outcome.inserted() == 0 => {
                stats.empty += 1;
                tracing::debug!(
                    symbol = %instrument.symbol,
                    gaps = outcome.gaps,
                    "채울 가격 없음"
                );
            }
            Ok(outcome) => {
                stats.success += 1;
                stats.inserted_samples += outcome.inserted();
                tracing::info!(
                    symbol = %instrument.symbol,
                    gaps = outcome.gaps,
                    fetched = outcome.fetched,
                    carried = outcome.carried,
                    "보충 및 저장 완료"
                );
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(symbol = %instrument.symbol, error = %e, "보충 실패");
            }
        }

        if requested_remote {
            tokio::time::sleep(config.backfill.request_delay()).await;
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 한 종목의 점검 기간을 보충합니다.
///
/// 추적 상태는 가격 배치가 저장된 뒤에만 갱신됩니다.
pub async fn backfill_instrument(
    store: &dyn PortfolioStore,
    source: Option<&dyn PriceSource>,
    policy: &dyn IntervalPolicy,
    instrument: &Instrument,
    window: DateRange,
    now: DateTime<Utc>,
) -> Result<BackfillOutcome> {
    let mut outcome = BackfillOutcome::default();
    let mut series = load_window(store, instrument, window).await?;

    let gaps = detect_series_gaps(&series, window, now, policy);
    outcome.gaps = gaps.len();
    if gaps.is_empty() {
        return Ok(outcome);
    }

    if let Some(source) = source {
        outcome.requested_remote = true;
        let mut fetched = Vec::new();
        for gap in &gaps {
            let granularity = AggregationFrequency::finest_covering(gap.interval);
            match source
                .fetch(instrument, gap.as_date_range(), granularity)
                .await
            {
                Ok(samples) => fetched.extend(samples),
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        from = %gap.from,
                        to = %gap.to,
                        error = %e,
                        "가격 소스 조회 실패, 직전 가격으로 대체"
                    );
                }
            }
        }

        if !fetched.is_empty() {
            for sample in &fetched {
                series.upsert(*sample);
            }
            outcome.fetched = store.upsert_prices(instrument.id, fetched).await?;
        }
    }

    let remaining = detect_series_gaps(&series, window, now, policy);
    let filled = carry_forward(&series, &remaining);
    if !filled.is_empty() {
        outcome.carried = store.upsert_prices(instrument.id, filled).await?;
    }

    let tracking = PriceTracking {
        last_checked_at: Some(now),
        last_sample_at: store
            .price_at(instrument.id, now)
            .await?
            .map(|sample| sample.time)
            .or(instrument.tracking.last_sample_at),
        sample_count: instrument.tracking.sample_count + outcome.inserted(),
    };
    store.update_price_tracking(instrument.id, tracking).await?;

    Ok(outcome)
}

/// 점검 기간의 샘플과 기간 시작 직전의 가격을 함께 읽습니다.
async fn load_window(
    store: &dyn PortfolioStore,
    instrument: &Instrument,
    window: DateRange,
) -> Result<PriceSeries> {
    let mut samples = store.load_prices(instrument.id, window).await?;
    if let Some(seed) = store.price_at(instrument.id, window.from()).await? {
        samples.push(seed);
    }
    Ok(PriceSeries::from_samples(samples))
}

fn select_instruments(instruments: Vec<Instrument>, symbols: Option<&str>) -> Vec<Instrument> {
    let Some(symbols) = symbols else {
        return instruments;
    };

    let wanted: Vec<String> = symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    tracing::info!(count = wanted.len(), "특정 종목 보충");

    instruments
        .into_iter()
        .filter(|i| wanted.contains(&i.symbol.to_uppercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_instruments() {
        let all = vec![
            Instrument::new("AAPL", "USD"),
            Instrument::new("MSFT", "USD"),
            Instrument::new("005930", "KRW"),
        ];

        assert_eq!(select_instruments(all.clone(), None).len(), 3);

        let picked = select_instruments(all, Some("aapl, 005930,"));
        let symbols: Vec<_> = picked.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "005930"]);
    }
}
