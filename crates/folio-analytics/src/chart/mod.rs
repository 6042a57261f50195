//! 차트 시리즈 생성.
//!
//! 요청 범위를 버킷으로 나누고, 버킷마다 시리즈 생성기의 스냅샷을
//! 요청된 지표 값으로 변환해 시간순 [`TimePoint`](folio_core::TimePoint) 목록을 만듭니다.

mod builder;

pub use builder::{ChartSeriesBuilder, Holding};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use folio_core::{AggregationFrequency, DateRange};

/// 차트 지표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMetric {
    /// 종목 가격 (종목 차트 전용)
    Price,
    /// 평가 가치 (포지션 전용)
    Value,
    /// 손익
    Profit,
    /// 단순 수익률
    Performance,
    /// 금액 가중 수익률, 연환산 (포지션 전용)
    MoneyWeightedReturn,
    /// 손익분기점 (포지션 전용)
    BreakEvenPoint,
}

impl ChartMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartMetric::Price => "price",
            ChartMetric::Value => "value",
            ChartMetric::Profit => "profit",
            ChartMetric::Performance => "performance",
            ChartMetric::MoneyWeightedReturn => "money_weighted_return",
            ChartMetric::BreakEvenPoint => "break_even_point",
        }
    }

    /// 종목 가격 시계열만으로 계산 가능한지 여부.
    pub fn supports_instrument(&self) -> bool {
        matches!(
            self,
            ChartMetric::Price | ChartMetric::Profit | ChartMetric::Performance
        )
    }

    /// 포지션(거래 포함)으로 계산 가능한지 여부.
    pub fn supports_positions(&self) -> bool {
        !matches!(self, ChartMetric::Price)
    }
}

impl fmt::Display for ChartMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "price" => Ok(ChartMetric::Price),
            "value" => Ok(ChartMetric::Value),
            "profit" => Ok(ChartMetric::Profit),
            "performance" => Ok(ChartMetric::Performance),
            "money_weighted_return" | "mwr" | "irr" => Ok(ChartMetric::MoneyWeightedReturn),
            "break_even_point" | "bep" => Ok(ChartMetric::BreakEvenPoint),
            _ => Err(format!("Unknown chart metric: {}", s)),
        }
    }
}

/// 차트 집계 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMode {
    /// 차트 시작 시점부터 각 버킷 끝까지 누적
    #[default]
    Cumulative,
    /// 각 버킷 안에서만 측정
    PerBucket,
}

/// 차트 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// 요청 범위
    pub range: DateRange,
    /// 샘플링 주기
    pub frequency: AggregationFrequency,
    /// 지표
    pub metric: ChartMetric,
    /// 집계 방식
    #[serde(default)]
    pub mode: ChartMode,
    /// 대상 통화 (없으면 종목 통화 그대로)
    #[serde(default)]
    pub currency: Option<String>,
}

impl ChartRequest {
    pub fn new(range: DateRange, frequency: AggregationFrequency, metric: ChartMetric) -> Self {
        Self {
            range,
            frequency,
            metric,
            mode: ChartMode::default(),
            currency: None,
        }
    }

    pub fn with_mode(mut self, mode: ChartMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into().to_uppercase());
        self
    }
}
