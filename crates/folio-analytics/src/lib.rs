//! 평가 및 집계 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 날짜 범위 버킷 분할 ([`bucket`])
//! - 다항식 근 탐색 ([`solver`])
//! - 금액 가중 수익률 ([`irr`])
//! - 가치/손익/수익률/손익분기점 계산 ([`valuation`])
//! - 가격/거래 시계열과 버킷의 전진 병합 ([`series`])
//! - 차트 시리즈 생성 ([`chart`])
//!
//! 모든 계산은 동기식 순수 함수이며 요청 간 공유 상태가 없습니다.

pub mod bucket;
pub mod chart;
pub mod irr;
pub mod series;
pub mod solver;
pub mod valuation;

pub use bucket::{BucketPlan, RangeBucketizer};
pub use chart::{ChartMetric, ChartMode, ChartRequest, ChartSeriesBuilder, Holding};
pub use irr::{CashFlow, CashFlowSchedule, MoneyWeightedReturn};
pub use series::{
    InstrumentPointGenerator, InstrumentSnapshot, PositionPointGenerator, PriceCursor,
    TransactionCursor,
};
pub use solver::{Polynomial, RootFinder};
pub use valuation::{
    break_even_point, performance, profit, range_performance, range_profit, value,
    PositionSnapshot, RangeBreakdown,
};
