//! 포지션 거래와 거래 원장.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Price, Quantity};

/// 포지션에 속한 단일 거래.
///
/// `amount`의 부호가 방향을 나타냅니다 (매수 +, 매도 -).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// 거래 ID
    pub id: Uuid,
    /// 체결 시각
    pub time: DateTime<Utc>,
    /// 거래 수량 (매수 +, 매도 -)
    pub amount: Quantity,
    /// 체결 가격
    pub price: Price,
}

impl Transaction {
    /// 새 거래를 생성합니다.
    pub fn new(time: DateTime<Utc>, amount: Quantity, price: Price) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            amount,
            price,
        }
    }

    /// 매수 거래를 생성합니다.
    pub fn buy(time: DateTime<Utc>, quantity: Quantity, price: Price) -> Self {
        Self::new(time, quantity.abs(), price)
    }

    /// 매도 거래를 생성합니다.
    pub fn sell(time: DateTime<Utc>, quantity: Quantity, price: Price) -> Self {
        Self::new(time, -quantity.abs(), price)
    }

    /// 거래 금액 (수량 × 가격, 부호 포함).
    pub fn notional(&self) -> Decimal {
        self.amount * self.price
    }

    pub fn is_buy(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// 한 포지션의 거래 원장.
///
/// 불변식: 거래는 항상 `time` 오름차순이며, 같은 시각의 거래는 추가된 순서를 유지합니다.
/// 원장은 추가/삭제만 허용합니다. 범위 손익 계산의 조기 종료(`time > to`에서 중단)와
/// 시리즈 생성기의 누적 슬라이스가 이 정렬에 의존합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Transaction>", into = "Vec<Transaction>")]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 임의 순서의 거래로 원장을 만듭니다.
    pub fn from_transactions(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by_key(|t| t.time);
        Self { transactions }
    }

    /// 거래를 정렬 위치에 추가합니다. 같은 시각의 기존 거래 뒤에 놓입니다.
    pub fn push(&mut self, transaction: Transaction) {
        let idx = self
            .transactions
            .partition_point(|t| t.time <= transaction.time);
        self.transactions.insert(idx, transaction);
    }

    /// ID로 거래를 제거합니다.
    pub fn remove(&mut self, id: Uuid) -> Option<Transaction> {
        let idx = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(idx))
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn first(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// `at` 이전 또는 같은 시각의 거래.
    pub fn until(&self, at: DateTime<Utc>) -> &[Transaction] {
        let end = self.transactions.partition_point(|t| t.time <= at);
        &self.transactions[..end]
    }

    /// `at` 시점의 보유 수량.
    pub fn quantity_at(&self, at: DateTime<Utc>) -> Quantity {
        self.until(at).iter().map(|t| t.amount).sum()
    }

    /// `until` 이전 또는 같은 시각의 거래를 수정합니다.
    ///
    /// 수량/가격만 바꾸며 시각은 바꾸지 않으므로 정렬이 유지됩니다.
    pub fn adjust_until<F>(&mut self, until: DateTime<Utc>, mut f: F) -> usize
    where
        F: FnMut(Quantity, Price) -> (Quantity, Price),
    {
        let end = self.transactions.partition_point(|t| t.time <= until);
        for transaction in &mut self.transactions[..end] {
            let (amount, price) = f(transaction.amount, transaction.price);
            transaction.amount = amount;
            transaction.price = price;
        }
        end
    }
}

impl From<Vec<Transaction>> for TransactionLedger {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self::from_transactions(transactions)
    }
}

impl From<TransactionLedger> for Vec<Transaction> {
    fn from(ledger: TransactionLedger) -> Self {
        ledger.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_buy_sell_sign() {
        assert_eq!(Transaction::buy(day(0), dec!(-3), dec!(10)).amount, dec!(3));
        assert_eq!(Transaction::sell(day(0), dec!(3), dec!(10)).amount, dec!(-3));
        assert_eq!(Transaction::sell(day(0), dec!(3), dec!(10)).notional(), dec!(-30));
    }

    #[test]
    fn test_push_keeps_ascending_order() {
        let mut ledger = TransactionLedger::new();
        ledger.push(Transaction::buy(day(5), dec!(1), dec!(10)));
        ledger.push(Transaction::buy(day(1), dec!(2), dec!(10)));
        let same_time = Transaction::sell(day(5), dec!(1), dec!(12));
        let same_time_id = same_time.id;
        ledger.push(same_time);

        let times: Vec<_> = ledger.as_slice().iter().map(|t| t.time).collect();
        assert_eq!(times, vec![day(1), day(5), day(5)]);
        // 같은 시각이면 나중에 추가된 거래가 뒤에 위치
        assert_eq!(ledger.as_slice()[2].id, same_time_id);
    }

    #[test]
    fn test_quantity_at_and_remove() {
        let buy = Transaction::buy(day(1), dec!(10), dec!(100));
        let sell = Transaction::sell(day(3), dec!(4), dec!(120));
        let sell_id = sell.id;
        let mut ledger = TransactionLedger::from_transactions(vec![sell, buy]);

        assert_eq!(ledger.quantity_at(day(0)), dec!(0));
        assert_eq!(ledger.quantity_at(day(2)), dec!(10));
        assert_eq!(ledger.quantity_at(day(3)), dec!(6));

        assert!(ledger.remove(sell_id).is_some());
        assert_eq!(ledger.quantity_at(day(3)), dec!(10));
        assert!(ledger.remove(sell_id).is_none());
    }
}
