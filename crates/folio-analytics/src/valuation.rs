//! 가치, 손익, 수익률, 손익분기점 계산.
//!
//! 모든 함수는 순수 함수이며 입력이 비어 있으면 0을 반환합니다.
//! 범위 계산은 거래가 시간순으로 정렬되어 있다고 가정합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use folio_core::{Price, Quantity, Transaction};

/// 시리즈 생성기가 버킷마다 만드는 포지션 스냅샷.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot<'a> {
    /// 처음 관측된 가격
    pub seed_price: Price,
    /// 버킷 시작 시점의 가격
    pub price_at_start: Price,
    /// 버킷 끝 시점의 가격
    pub price_at_end: Price,
    /// 버킷 끝 이전 또는 같은 시각의 누적 거래 (시간순)
    pub transactions: &'a [Transaction],
}

impl<'a> PositionSnapshot<'a> {
    /// 시작 가격만 바꾼 스냅샷 (누적 차트의 기준 가격 적용).
    pub fn with_start_price(self, price_at_start: Price) -> Self {
        Self {
            price_at_start,
            ..self
        }
    }

    /// `at` 시점의 보유 수량.
    pub fn quantity_at(&self, at: DateTime<Utc>) -> Quantity {
        self.transactions
            .iter()
            .take_while(|t| t.time <= at)
            .map(|t| t.amount)
            .sum()
    }
}

/// 단순 손익.
pub fn profit(start_price: Price, end_price: Price) -> Decimal {
    end_price - start_price
}

/// 단순 수익률.
///
/// 기준가가 0이면 나눌 수 없으므로 종가가 양수일 때 1(100%), 둘 다 0이면 0을 반환합니다.
pub fn performance(start_price: Price, end_price: Price) -> Decimal {
    if !start_price.is_zero() {
        return (end_price - start_price) / start_price;
    }
    match end_price.cmp(&Decimal::ZERO) {
        Ordering::Greater => Decimal::ONE,
        Ordering::Equal => Decimal::ZERO,
        // 기준가 0에서 음수 평가액: 전액 손실로 취급
        Ordering::Less => -Decimal::ONE,
    }
}

/// 평가 시점 가치 합계.
///
/// 스냅샷마다 `as_of` 이전 거래의 보유 수량에 버킷 끝 가격을 곱합니다.
pub fn value(snapshots: &[PositionSnapshot<'_>], as_of: DateTime<Utc>) -> Decimal {
    snapshots
        .iter()
        .map(|s| s.quantity_at(as_of) * s.price_at_end)
        .sum()
}

/// 수량 가중 평균 진입가. 총 수량이 0이면 0.
pub fn break_even_point(transactions: &[Transaction]) -> Price {
    let (notional, quantity) = transactions
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(n, q), t| {
            (n + t.notional(), q + t.amount)
        });
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        notional / quantity
    }
}

/// 범위 손익의 구성 요소.
///
/// 손익 = `realized + unrealized_end - unrealized_start`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBreakdown {
    /// 범위 내 거래의 현금 흐름 합계 (매수 -, 매도 +)
    pub realized: Decimal,
    /// 범위 시작 시 보유분의 평가액
    pub unrealized_start: Decimal,
    /// 범위 끝 보유분의 평가액
    pub unrealized_end: Decimal,
    /// 범위 내 매수 금액 합계
    pub invested: Decimal,
}

impl RangeBreakdown {
    /// 한 포지션의 범위 손익 구성을 계산합니다.
    ///
    /// `from >= to`이면 모든 값이 0입니다.
    /// 거래는 시간순이어야 하며 `time > to`인 첫 거래에서 순회를 멈춥니다.
    pub fn compute(
        transactions: &[Transaction],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        price_at_start: Price,
        price_at_end: Price,
    ) -> Self {
        let mut breakdown = Self::default();
        if from >= to {
            return breakdown;
        }

        for transaction in transactions {
            if transaction.time > to {
                break;
            }
            breakdown.unrealized_end += transaction.amount * price_at_end;
            if transaction.time < from {
                breakdown.unrealized_start += transaction.amount * price_at_start;
            } else {
                breakdown.realized -= transaction.notional();
                if transaction.is_buy() {
                    breakdown.invested += transaction.notional();
                }
            }
        }
        breakdown
    }

    /// 스냅샷의 시작/끝 가격으로 계산합니다.
    pub fn from_snapshot(
        snapshot: &PositionSnapshot<'_>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        Self::compute(
            snapshot.transactions,
            from,
            to,
            snapshot.price_at_start,
            snapshot.price_at_end,
        )
    }

    pub fn profit(&self) -> Decimal {
        self.realized + self.unrealized_end - self.unrealized_start
    }

    /// 투입 원금 (시작 평가액 + 범위 내 매수 금액).
    pub fn basis(&self) -> Decimal {
        self.unrealized_start + self.invested
    }

    /// 투입 원금 대비 수익률.
    pub fn performance(&self) -> Decimal {
        let basis = self.basis();
        performance(basis, basis + self.profit())
    }

    /// 모든 구성 요소에 함수를 적용합니다 (통화 변환 등).
    pub fn try_map<F, E>(self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(Decimal) -> Result<Decimal, E>,
    {
        Ok(Self {
            realized: f(self.realized)?,
            unrealized_start: f(self.unrealized_start)?,
            unrealized_end: f(self.unrealized_end)?,
            invested: f(self.invested)?,
        })
    }
}

impl Add for RangeBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            realized: self.realized + rhs.realized,
            unrealized_start: self.unrealized_start + rhs.unrealized_start,
            unrealized_end: self.unrealized_end + rhs.unrealized_end,
            invested: self.invested + rhs.invested,
        }
    }
}

impl AddAssign for RangeBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for RangeBreakdown {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// 여러 포지션의 범위 손익. `from >= to`이면 0.
pub fn range_profit(
    snapshots: &[PositionSnapshot<'_>],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Decimal {
    range_breakdown(snapshots, from, to).profit()
}

/// 여러 포지션의 범위 수익률. `from >= to`이면 0.
pub fn range_performance(
    snapshots: &[PositionSnapshot<'_>],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Decimal {
    range_breakdown(snapshots, from, to).performance()
}

fn range_breakdown(
    snapshots: &[PositionSnapshot<'_>],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RangeBreakdown {
    snapshots
        .iter()
        .map(|s| RangeBreakdown::from_snapshot(s, from, to))
        .sum()
}
