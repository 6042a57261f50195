//! 종목, 포지션 및 가격 추적 메타데이터.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionLedger;

/// 가격이 추적되는 투자 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목 ID
    pub id: Uuid,
    /// 가격 소스 심볼 (예: "AAPL", "005930.KS")
    pub symbol: String,
    /// 가격 통화
    pub currency: String,
    /// 가격 추적 메타데이터
    #[serde(default)]
    pub tracking: PriceTracking,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            currency: currency.into().to_uppercase(),
            tracking: PriceTracking::default(),
        }
    }
}

/// 한 종목에 대한 보유 포지션.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 포지션 ID
    pub id: Uuid,
    /// 대상 종목 ID
    pub instrument_id: Uuid,
    /// 거래 원장
    #[serde(default)]
    pub transactions: TransactionLedger,
}

impl Position {
    pub fn new(instrument_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id,
            transactions: TransactionLedger::new(),
        }
    }

    pub fn with_transactions(mut self, transactions: TransactionLedger) -> Self {
        self.transactions = transactions;
        self
    }
}

/// 종목별 가격 추적 상태.
///
/// 가격 배치가 저장된 뒤에만 갱신됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTracking {
    /// 마지막으로 누락 구간을 점검한 시각
    pub last_checked_at: Option<DateTime<Utc>>,
    /// 저장된 마지막 샘플 시각
    pub last_sample_at: Option<DateTime<Utc>>,
    /// 저장된 샘플 수
    pub sample_count: usize,
}
