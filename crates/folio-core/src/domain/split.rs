//! 주식 분할 비율, 처리 상태 및 조정 로직.
//!
//! 분할은 유효 시각 이전(포함)의 모든 가격과 거래를 곱셈적으로 조정합니다.
//! 여러 분할이 같은 레코드를 조정해도 곱으로 합성되며,
//! 중복 적용 방지는 값 재검출이 아니라 [`SplitProcessingState`]로 보장합니다.
//!
//! # 비율 방향
//!
//! `numerator`는 분할 후 주식 수, `denominator`는 분할 전 주식 수입니다.
//! 2:1 분할(1주 → 2주)은 `SplitRatio::new(2, 1)`입니다.
//!
//! | 대상 | 적용 | 되돌리기 |
//! |---|---|---|
//! | 가격 | × den / num | × num / den |
//! | 거래 수량 | × num / den | × den / num |
//! | 거래 가격 | × den / num | × num / den |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::price::PriceSeries;
use super::transaction::TransactionLedger;
use crate::error::{FolioError, FolioResult};
use crate::types::{Price, Quantity};

/// 분할 비율 (분할 후 : 분할 전).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRatio {
    numerator: u32,
    denominator: u32,
}

impl SplitRatio {
    /// 새 비율을 생성합니다. 두 값 모두 양수여야 합니다.
    pub fn new(numerator: u32, denominator: u32) -> FolioResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(FolioError::InvalidInput(format!(
                "분할 비율은 양수여야 합니다: {}:{}",
                numerator, denominator
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// 주어진 방향의 가격 조정.
    pub fn adjust_price(&self, price: Price, direction: SplitDirection) -> Price {
        let (num, den) = self.factors();
        match direction {
            SplitDirection::Apply => price * den / num,
            SplitDirection::Revert => price * num / den,
        }
    }

    /// 주어진 방향의 수량 조정.
    pub fn adjust_amount(&self, amount: Quantity, direction: SplitDirection) -> Quantity {
        let (num, den) = self.factors();
        match direction {
            SplitDirection::Apply => amount * num / den,
            SplitDirection::Revert => amount * den / num,
        }
    }

    fn factors(&self) -> (Decimal, Decimal) {
        (
            Decimal::from(self.numerator),
            Decimal::from(self.denominator),
        )
    }
}

impl fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

/// 조정 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    /// 분할 적용
    Apply,
    /// 분할 되돌리기
    Revert,
}

/// 분할 이벤트 처리 상태.
///
/// 전이: `NotProcessed → Processed` (적용),
/// `Processed → RollbackRequested → RolledBack` (되돌리기).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitProcessingState {
    /// 아직 적용되지 않음
    NotProcessed,
    /// 적용 완료
    Processed,
    /// 사용자가 되돌리기를 요청함
    RollbackRequested,
    /// 되돌리기 완료
    RolledBack,
}

impl SplitProcessingState {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotProcessed => "not_processed",
            Self::Processed => "processed",
            Self::RollbackRequested => "rollback_requested",
            Self::RolledBack => "rolled_back",
        }
    }

    /// 이 상태에서 재적용기가 수행할 조정 방향과 완료 후 상태.
    ///
    /// 처리할 일이 없는 상태면 `None`.
    pub fn pending_action(&self) -> Option<(SplitDirection, SplitProcessingState)> {
        match self {
            Self::NotProcessed => Some((SplitDirection::Apply, Self::Processed)),
            Self::RollbackRequested => Some((SplitDirection::Revert, Self::RolledBack)),
            Self::Processed | Self::RolledBack => None,
        }
    }

    /// 허용된 전이인지 확인합니다.
    pub fn can_transition_to(&self, next: SplitProcessingState) -> bool {
        matches!(
            (self, next),
            (Self::NotProcessed, Self::Processed)
                | (Self::Processed, Self::RollbackRequested)
                | (Self::RollbackRequested, Self::RolledBack)
        )
    }
}

impl fmt::Display for SplitProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 기록된 주식 분할 이벤트.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSplit {
    /// 분할 ID
    pub id: Uuid,
    /// 대상 종목 ID
    pub instrument_id: Uuid,
    /// 유효 시각 (이 시각 이전/포함 레코드가 조정 대상)
    pub effective_at: DateTime<Utc>,
    /// 분할 비율
    pub ratio: SplitRatio,
    /// 처리 상태
    pub state: SplitProcessingState,
}

impl StockSplit {
    pub fn new(instrument_id: Uuid, effective_at: DateTime<Utc>, ratio: SplitRatio) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id,
            effective_at,
            ratio,
            state: SplitProcessingState::NotProcessed,
        }
    }

    /// 되돌리기를 요청합니다. `Processed` 상태에서만 허용됩니다.
    pub fn request_rollback(&mut self) -> FolioResult<()> {
        self.transition(SplitProcessingState::RollbackRequested)
    }

    /// 상태를 전이합니다.
    pub fn transition(&mut self, next: SplitProcessingState) -> FolioResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(FolioError::InvalidInput(format!(
                "허용되지 않는 분할 상태 전이: {} -> {}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

/// 분할 조정 결과 요약.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitAdjustment {
    /// 조정된 가격 샘플 수
    pub prices: usize,
    /// 조정된 거래 수
    pub transactions: usize,
}

/// 가격 시계열에 분할 조정을 적용합니다.
pub fn adjust_price_series(
    series: &mut PriceSeries,
    split: &StockSplit,
    direction: SplitDirection,
) -> usize {
    series.map_prices_until(split.effective_at, |price| {
        split.ratio.adjust_price(price, direction)
    })
}

/// 거래 원장에 분할 조정을 적용합니다.
pub fn adjust_ledger(
    ledger: &mut TransactionLedger,
    split: &StockSplit,
    direction: SplitDirection,
) -> usize {
    ledger.adjust_until(split.effective_at, |amount, price| {
        (
            split.ratio.adjust_amount(amount, direction),
            split.ratio.adjust_price(price, direction),
        )
    })
}
