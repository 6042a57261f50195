//! 날짜 범위를 고정 폭 버킷으로 분할합니다.
//!
//! 버킷 수가 최대 포인트 수를 넘으면 주기를 늘리는 대신 범위 시작을 뒤로 당깁니다.
//! 즉, 해상도는 유지하고 오래된 구간을 포기합니다.

use chrono::{DateTime, Duration, Utc};
use folio_core::{AggregationFrequency, ChartConfig, DateRange, FolioError, FolioResult};

/// 버킷 분할 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    /// 실제 사용된 시작 시각 (잘렸으면 원래 `from`보다 늦음)
    pub from: DateTime<Utc>,
    /// 종료 시각
    pub to: DateTime<Utc>,
    /// 버킷 목록 (시간순, 연속, 겹치지 않음)
    pub buckets: Vec<DateRange>,
}

impl BucketPlan {
    /// 최대 포인트 수 때문에 시작 시각이 조정되었는지 여부.
    pub fn is_truncated(&self, requested_from: DateTime<Utc>) -> bool {
        self.from > requested_from
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// 범위 버킷 분할기.
#[derive(Debug, Clone, Copy)]
pub struct RangeBucketizer {
    max_points: usize,
}

impl Default for RangeBucketizer {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl RangeBucketizer {
    /// 최대 포인트 수를 지정해 생성합니다 (최소 1).
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(1),
        }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.max_points)
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// `[from, to]`를 `frequency` 간격의 버킷으로 분할합니다.
    ///
    /// `from == to`이면 폭 0 버킷 하나를 반환합니다.
    /// 마지막 버킷의 끝은 `to`로 잘리므로 명목 기간보다 짧을 수 있습니다.
    pub fn bucketize(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        frequency: AggregationFrequency,
    ) -> FolioResult<BucketPlan> {
        if from > to {
            return Err(FolioError::InvalidRange { from, to });
        }
        if from == to {
            return Ok(BucketPlan {
                from,
                to,
                buckets: vec![DateRange::instant(from)],
            });
        }

        let step = frequency.nominal_duration();
        let step_ns = total_nanos(step);
        let total_ns = total_nanos(to - from);

        // 올림 나눗셈, from < to이므로 1 이상
        let ideal = (total_ns + step_ns - 1) / step_ns;
        let (from, count) = if ideal > self.max_points as i128 {
            let count = self.max_points;
            (to - step * count as i32, count)
        } else {
            (from, ideal as usize)
        };

        let buckets = Self::emit(from, to, step, count)?;
        Ok(BucketPlan { from, to, buckets })
    }

    fn emit(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        step: Duration,
        count: usize,
    ) -> FolioResult<Vec<DateRange>> {
        let mut buckets = Vec::with_capacity(count);
        let mut start = from;
        for _ in 0..count {
            let end = (start + step).min(to);
            buckets.push(DateRange::new(start, end)?);
            start = end;
        }
        Ok(buckets)
    }
}

/// 밀리초 미만 구간도 버킷 수에 반영되도록 나노초 단위로 셉니다.
fn total_nanos(duration: Duration) -> i128 {
    duration.num_seconds() as i128 * 1_000_000_000 + duration.subsec_nanos() as i128
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_exact_multiple() {
        let bucketizer = RangeBucketizer::new(500);
        let plan = bucketizer
            .bucketize(base(), base() + Duration::days(7), AggregationFrequency::Day)
            .unwrap();

        assert_eq!(plan.len(), 7);
        assert_eq!(plan.from, base());
        assert_eq!(plan.buckets[0].from(), base());
        assert_eq!(plan.buckets[6].to(), base() + Duration::days(7));
    }

    #[test]
    fn test_last_bucket_clamped() {
        let bucketizer = RangeBucketizer::new(500);
        let to = base() + Duration::hours(2) + Duration::minutes(30);
        let plan = bucketizer
            .bucketize(base(), to, AggregationFrequency::Hour)
            .unwrap();

        assert_eq!(plan.len(), 3);
        let last = plan.buckets.last().unwrap();
        assert_eq!(last.to(), to);
        assert_eq!(last.duration(), Duration::minutes(30));
    }

    #[test]
    fn test_truncation_keeps_frequency() {
        let bucketizer = RangeBucketizer::new(10);
        let to = base() + Duration::days(30);
        let plan = bucketizer
            .bucketize(base(), to, AggregationFrequency::Day)
            .unwrap();

        assert!(plan.is_truncated(base()));
        assert_eq!(plan.from, to - Duration::days(10));
        assert_eq!(plan.len(), 10);
        assert!(plan
            .buckets
            .iter()
            .all(|b| b.duration() == Duration::days(1)));
    }

    #[test]
    fn test_instant_range() {
        let plan = RangeBucketizer::default()
            .bucketize(base(), base(), AggregationFrequency::Week)
            .unwrap();
        assert_eq!(plan.buckets, vec![DateRange::instant(base())]);
    }

    #[test]
    fn test_sub_millisecond_range() {
        let to = base() + Duration::microseconds(1);
        let plan = RangeBucketizer::default()
            .bucketize(base(), to, AggregationFrequency::FiveMinutes)
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.buckets[0].from(), base());
        assert_eq!(plan.buckets[0].to(), to);
    }

    #[test]
    fn test_sub_millisecond_remainder_gets_bucket() {
        let to = base() + Duration::hours(1) + Duration::nanoseconds(500);
        let plan = RangeBucketizer::default()
            .bucketize(base(), to, AggregationFrequency::Hour)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.buckets[1].to(), to);
        assert_eq!(plan.buckets[1].duration(), Duration::nanoseconds(500));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = RangeBucketizer::default().bucketize(
            base() + Duration::days(1),
            base(),
            AggregationFrequency::Day,
        );
        assert!(matches!(result, Err(FolioError::InvalidRange { .. })));
    }
}
