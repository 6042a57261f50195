//! 누락 구간 탐지와 직전 가격 유지(carry-forward) 보충.
//!
//! 기준 시각에 가까울수록 촘촘한 샘플링을 요구하는 단계별 정책을 사용합니다.
//! 탐지와 보충은 메모리 안에서만 동작하며 I/O가 없습니다.

use chrono::{DateTime, Duration, Utc};

use folio_core::{DateRange, MissingRange, PriceSample, PriceSeries};

use crate::config::IntervalTierConfig;

/// 샘플링 밀도 정책.
pub trait IntervalPolicy: Send + Sync {
    /// `reference` 기준으로 `at` 시점에 요구되는 최대 샘플 간격.
    fn required_interval(&self, reference: DateTime<Utc>, at: DateTime<Utc>) -> Duration;
}

/// 기준 시각과의 거리 상한과 그 안에서 요구되는 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTier {
    pub within: Duration,
    pub interval: Duration,
}

/// 단계별 밀도 정책.
///
/// 기본값: 1일 이내 5분, 5일 이내 1시간, 그 외 1일.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredIntervalPolicy {
    tiers: Vec<IntervalTier>,
    fallback: Duration,
}

impl Default for TieredIntervalPolicy {
    fn default() -> Self {
        Self::from_config(&IntervalTierConfig::default())
    }
}

impl TieredIntervalPolicy {
    /// 단계는 `within` 오름차순으로 정렬됩니다.
    pub fn new(mut tiers: Vec<IntervalTier>, fallback: Duration) -> Self {
        tiers.sort_by_key(|tier| tier.within);
        Self { tiers, fallback }
    }

    pub fn from_config(config: &IntervalTierConfig) -> Self {
        Self::new(
            vec![
                IntervalTier {
                    within: Duration::hours(config.fine_within_hours),
                    interval: Duration::minutes(config.fine_interval_minutes),
                },
                IntervalTier {
                    within: Duration::hours(config.medium_within_hours),
                    interval: Duration::minutes(config.medium_interval_minutes),
                },
            ],
            Duration::minutes(config.coarse_interval_minutes),
        )
    }
}

impl IntervalPolicy for TieredIntervalPolicy {
    fn required_interval(&self, reference: DateTime<Utc>, at: DateTime<Utc>) -> Duration {
        let age = (reference - at).max(Duration::zero());
        self.tiers
            .iter()
            .find(|tier| age <= tier.within)
            .map(|tier| tier.interval)
            .unwrap_or(self.fallback)
    }
}

/// 누락 구간을 탐지합니다.
///
/// `[range.from, 범위 안의 샘플 시각들…, range.to]`를 순서대로 보며,
/// 인접한 두 시각의 차이가 두 끝점의 요구 간격 중 작은 값보다 크면 누락 구간입니다.
/// `timestamps`는 오름차순이어야 합니다.
pub fn detect_gaps(
    timestamps: &[DateTime<Utc>],
    range: DateRange,
    reference: DateTime<Utc>,
    policy: &dyn IntervalPolicy,
) -> Vec<MissingRange> {
    let inner = timestamps
        .iter()
        .copied()
        .filter(|t| range.contains(*t));
    let sequence = std::iter::once(range.from())
        .chain(inner)
        .chain(std::iter::once(range.to()));

    let mut missing = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;
    for current in sequence {
        if let Some(prev) = previous {
            if current <= prev {
                continue;
            }
            let required = policy
                .required_interval(reference, prev)
                .min(policy.required_interval(reference, current));
            if current - prev > required {
                missing.push(MissingRange::new(prev, current, required));
            }
        }
        previous = Some(current);
    }
    missing
}

/// 시계열 전체 샘플로 누락 구간을 탐지합니다.
pub fn detect_series_gaps(
    series: &PriceSeries,
    range: DateRange,
    reference: DateTime<Utc>,
    policy: &dyn IntervalPolicy,
) -> Vec<MissingRange> {
    let timestamps: Vec<DateTime<Utc>> = series
        .range(range.from(), range.to())
        .iter()
        .map(|s| s.time)
        .collect();
    detect_gaps(&timestamps, range, reference, policy)
}

/// 누락 구간을 직전 실제 가격으로 채울 샘플을 만듭니다.
///
/// 각 구간에서 `from + k·interval` (k ≥ 1, `< to`) 시각마다 샘플을 생성합니다.
/// `from` 이전 또는 같은 시각의 가격이 없는 구간은 건너뜁니다.
pub fn carry_forward(series: &PriceSeries, missing: &[MissingRange]) -> Vec<PriceSample> {
    let mut filled = Vec::new();
    for gap in missing {
        if gap.interval <= Duration::zero() {
            continue;
        }
        let Some(last) = series.price_at(gap.from) else {
            continue;
        };

        let mut at = gap.from + gap.interval;
        while at < gap.to {
            filled.push(PriceSample::new(at, last.price));
            at += gap.interval;
        }
    }
    filled
}
