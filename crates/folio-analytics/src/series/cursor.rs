use chrono::{DateTime, Utc};

use folio_core::{Price, PriceSample, Transaction};

/// 정렬된 가격 샘플 위의 전진 전용 커서.
#[derive(Debug, Clone)]
pub struct PriceCursor<'a> {
    samples: &'a [PriceSample],
    next: usize,
}

impl<'a> PriceCursor<'a> {
    pub fn new(samples: &'a [PriceSample]) -> Self {
        Self { samples, next: 0 }
    }

    /// `at` 이전 또는 같은 시각의 샘플까지 전진하고 그 시점의 가격을 반환합니다.
    ///
    /// 이미 지난 시각을 주면 이동하지 않고 현재 가격을 반환합니다.
    pub fn advance_to(&mut self, at: DateTime<Utc>) -> Option<Price> {
        while self
            .samples
            .get(self.next)
            .is_some_and(|sample| sample.time <= at)
        {
            self.next += 1;
        }
        self.current()
    }

    /// 마지막으로 지나간 샘플의 가격.
    pub fn current(&self) -> Option<Price> {
        self.next
            .checked_sub(1)
            .map(|idx| self.samples[idx].price)
    }

    /// 처음 관측된 가격 (아직 아무 샘플도 지나지 않았으면 `None`).
    pub fn seed(&self) -> Option<Price> {
        if self.next == 0 {
            None
        } else {
            self.samples.first().map(|sample| sample.price)
        }
    }

    /// 지나간 샘플 수.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

/// 정렬된 거래 위의 전진 전용 커서.
///
/// 지나간 거래는 원본 슬라이스의 접두사로 누적되므로 복사가 없습니다.
#[derive(Debug, Clone)]
pub struct TransactionCursor<'a> {
    transactions: &'a [Transaction],
    end: usize,
}

impl<'a> TransactionCursor<'a> {
    pub fn new(transactions: &'a [Transaction]) -> Self {
        Self {
            transactions,
            end: 0,
        }
    }

    /// `at` 이전 또는 같은 시각의 거래까지 전진하고 누적 거래를 반환합니다.
    pub fn advance_to(&mut self, at: DateTime<Utc>) -> &'a [Transaction] {
        while self
            .transactions
            .get(self.end)
            .is_some_and(|transaction| transaction.time <= at)
        {
            self.end += 1;
        }
        self.observed()
    }

    /// 지금까지 지나간 거래.
    pub fn observed(&self) -> &'a [Transaction] {
        &self.transactions[..self.end]
    }

    pub fn last(&self) -> Option<&'a Transaction> {
        self.observed().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    #[test]
    fn test_price_cursor_never_rewinds() {
        let samples = vec![
            PriceSample::new(t(1), dec!(10)),
            PriceSample::new(t(2), dec!(11)),
            PriceSample::new(t(4), dec!(12)),
        ];
        let mut cursor = PriceCursor::new(&samples);

        assert_eq!(cursor.advance_to(t(0)), None);
        assert_eq!(cursor.seed(), None);
        assert_eq!(cursor.advance_to(t(2)), Some(dec!(11)));
        assert_eq!(cursor.seed(), Some(dec!(10)));
        // 과거 시각을 줘도 되돌아가지 않음
        assert_eq!(cursor.advance_to(t(1)), Some(dec!(11)));
        assert_eq!(cursor.advance_to(t(10)), Some(dec!(12)));
        assert_eq!(cursor.consumed(), 3);
    }

    #[test]
    fn test_transaction_cursor_accumulates() {
        let transactions = vec![
            Transaction::buy(t(1), dec!(1), dec!(10)),
            Transaction::buy(t(3), dec!(1), dec!(11)),
        ];
        let mut cursor = TransactionCursor::new(&transactions);

        assert!(cursor.advance_to(t(0)).is_empty());
        assert_eq!(cursor.advance_to(t(1)).len(), 1);
        assert_eq!(cursor.advance_to(t(5)).len(), 2);
        assert_eq!(cursor.last().map(|t| t.price), Some(dec!(11)));
    }
}
