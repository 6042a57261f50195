use folio_core::{DateRange, PriceSample, Transaction};

use super::cursor::{PriceCursor, TransactionCursor};
use crate::valuation::PositionSnapshot;

/// 포지션(가격 + 거래)용 생성기.
///
/// 가격이 아직 없으면 가장 최근 거래의 체결가를 대신 사용합니다.
#[derive(Debug, Clone)]
pub struct PositionPointGenerator<'a> {
    prices: PriceCursor<'a>,
    transactions: TransactionCursor<'a>,
}

impl<'a> PositionPointGenerator<'a> {
    pub fn new(samples: &'a [PriceSample], transactions: &'a [Transaction]) -> Self {
        Self {
            prices: PriceCursor::new(samples),
            transactions: TransactionCursor::new(transactions),
        }
    }

    /// 다음 버킷의 스냅샷. 가격도 거래도 아직 없으면 `None`.
    ///
    /// 한 번 `Some`이 나온 뒤로는 다시 `None`이 되지 않습니다.
    pub fn snapshot(&mut self, bucket: &DateRange) -> Option<PositionSnapshot<'a>> {
        let start = self.prices.advance_to(bucket.from());
        let end = self.prices.advance_to(bucket.to());
        let transactions = self.transactions.advance_to(bucket.to());

        let fallback = self.transactions.last().map(|t| t.price);
        let price_at_end = end.or(fallback)?;
        let seed_price = self
            .prices
            .seed()
            .or_else(|| transactions.first().map(|t| t.price))
            .unwrap_or(price_at_end);

        Some(PositionSnapshot {
            seed_price,
            price_at_start: start.unwrap_or(seed_price),
            price_at_end,
            transactions,
        })
    }

    /// 모든 버킷을 순서대로 처리합니다.
    pub fn generate(&mut self, buckets: &[DateRange]) -> Vec<Option<PositionSnapshot<'a>>> {
        buckets.iter().map(|bucket| self.snapshot(bucket)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn bucket(from: i64, to: i64) -> DateRange {
        DateRange::new(day(from), day(to)).unwrap()
    }

    #[test]
    fn test_transaction_before_first_price() {
        let samples = vec![PriceSample::new(day(3), dec!(55))];
        let transactions = vec![Transaction::buy(day(1), dec!(2), dec!(50))];
        let mut generator = PositionPointGenerator::new(&samples, &transactions);

        let snapshots = generator.generate(&[bucket(0, 1), bucket(1, 2), bucket(2, 3)]);

        let first = snapshots[0].unwrap();
        assert_eq!(first.price_at_end, dec!(50));
        assert_eq!(first.transactions.len(), 1);

        let third = snapshots[2].unwrap();
        assert_eq!(third.seed_price, dec!(55));
        assert_eq!(third.price_at_end, dec!(55));
    }

    #[test]
    fn test_empty_position_is_none() {
        let samples = vec![PriceSample::new(day(5), dec!(1))];
        let mut generator = PositionPointGenerator::new(&samples, &[]);
        assert!(generator.snapshot(&bucket(0, 1)).is_none());
        assert!(generator.snapshot(&bucket(5, 6)).is_some());
    }

    #[test]
    fn test_cumulative_transactions() {
        let samples = vec![PriceSample::new(day(0), dec!(10))];
        let transactions = vec![
            Transaction::buy(day(1), dec!(1), dec!(10)),
            Transaction::buy(day(2), dec!(1), dec!(10)),
            Transaction::sell(day(4), dec!(1), dec!(12)),
        ];
        let mut generator = PositionPointGenerator::new(&samples, &transactions);

        let lengths: Vec<usize> = generator
            .generate(&[bucket(0, 1), bucket(1, 2), bucket(2, 3), bucket(3, 4)])
            .into_iter()
            .map(|s| s.map(|s| s.transactions.len()).unwrap_or(0))
            .collect();
        assert_eq!(lengths, vec![1, 2, 2, 3]);
    }
}
