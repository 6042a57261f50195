//! 금액 가중 수익률(IRR) 계산.
//!
//! 범위 `[from, to]`를 고정 기간(기본 1일)으로 나누고 각 현금흐름을 기간 오프셋에 배치합니다.
//! `x = 1 + r`(기간 수익률)일 때 순현재가치가 0이 되는 조건
//! `Σ c_k / x^k = 0`에 `x^N`을 곱한 다항식 `Σ c_k · x^(N-k) = 0`의 근을 구합니다.
//!
//! 현금흐름 부호:
//! - 범위 시작 시 보유분의 평가액: 음수 (매입으로 간주)
//! - 매수: 음수, 매도: 양수
//! - 범위 끝 보유분의 평가액: 양수 (청산으로 간주)

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use folio_core::{
    decimal_from_f64, DateRange, DecimalExt, FolioError, FolioResult, Price, SolverConfig,
    Transaction,
};

use crate::solver::{Polynomial, RootFinder};

/// 기간 오프셋에 배치된 현금흐름.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashFlow {
    /// 범위 시작으로부터의 기간 수
    pub offset: usize,
    /// 금액 (유출 -, 유입 +)
    pub amount: Decimal,
}

/// 한 번의 수익률 계산에 사용할 현금흐름 모음.
#[derive(Debug, Clone)]
pub struct CashFlowSchedule {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    period: Duration,
    flows: Vec<CashFlow>,
}

impl CashFlowSchedule {
    /// 일 단위 기간으로 생성합니다.
    pub fn daily(range: DateRange) -> Self {
        Self::new(range, Duration::days(1))
    }

    pub fn new(range: DateRange, period: Duration) -> Self {
        let period = if period <= Duration::zero() {
            Duration::days(1)
        } else {
            period
        };
        Self {
            from: range.from(),
            to: range.to(),
            period,
            flows: Vec::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 마지막 오프셋 `N`.
    pub fn horizon(&self) -> usize {
        self.offset_of(self.to)
    }

    /// 시각을 기간 오프셋으로 변환합니다 (범위 밖은 양 끝으로 고정).
    pub fn offset_of(&self, at: DateTime<Utc>) -> usize {
        let at = at.max(self.from).min(self.to);
        let elapsed = (at - self.from).num_milliseconds();
        (elapsed / self.period.num_milliseconds()) as usize
    }

    pub fn push(&mut self, at: DateTime<Utc>, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        let offset = self.offset_of(at);
        self.flows.push(CashFlow { offset, amount });
    }

    /// 한 포지션의 현금흐름을 추가합니다.
    ///
    /// `transactions`는 시간순이어야 합니다. `price_at_start`는 범위 시작 전에
    /// 보유한 수량이 있을 때만 사용됩니다.
    pub fn add_position(
        &mut self,
        transactions: &[Transaction],
        price_at_start: Price,
        price_at_end: Price,
    ) -> FolioResult<()> {
        self.add_position_with(transactions, price_at_start, price_at_end, |amount, _| {
            Ok(amount)
        })
    }

    /// 금액마다 `convert(amount, at)`을 적용하며 현금흐름을 추가합니다.
    pub fn add_position_with<F>(
        &mut self,
        transactions: &[Transaction],
        price_at_start: Price,
        price_at_end: Price,
        mut convert: F,
    ) -> FolioResult<()>
    where
        F: FnMut(Decimal, DateTime<Utc>) -> FolioResult<Decimal>,
    {
        let mut quantity_before = Decimal::ZERO;
        let mut quantity_end = Decimal::ZERO;

        for transaction in transactions {
            if transaction.time > self.to {
                break;
            }
            quantity_end += transaction.amount;
            if transaction.time < self.from {
                quantity_before += transaction.amount;
                continue;
            }
            let amount = convert(-transaction.notional(), transaction.time)?;
            self.push(transaction.time, amount);
        }

        if !quantity_before.is_zero() {
            let amount = convert(-(quantity_before * price_at_start), self.from)?;
            self.push(self.from, amount);
        }
        if !quantity_end.is_zero() {
            let amount = convert(quantity_end * price_at_end, self.to)?;
            self.push(self.to, amount);
        }
        Ok(())
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// 현금흐름 다항식 `Σ c_k · x^(N-k)`.
    pub fn to_polynomial(&self) -> Polynomial {
        let horizon = self.horizon();
        let mut polynomial = Polynomial::new();
        for flow in &self.flows {
            polynomial.add_term(horizon - flow.offset, flow.amount.to_f64_lossy());
        }
        polynomial
    }
}

/// 금액 가중 수익률 계산기.
#[derive(Debug, Clone, Copy)]
pub struct MoneyWeightedReturn {
    finder: RootFinder,
    initial_guess: f64,
}

impl Default for MoneyWeightedReturn {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl MoneyWeightedReturn {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            finder: RootFinder::from_config(config),
            initial_guess: config.initial_guess,
        }
    }

    /// 연환산 수익률을 계산합니다.
    ///
    /// 현금흐름이 없으면 0을 반환합니다. 근이 없거나 양수가 아니면 `NonConvergence`.
    pub fn annualized(&self, schedule: &CashFlowSchedule) -> FolioResult<Decimal> {
        let polynomial = schedule.to_polynomial();
        if polynomial.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let root = self.finder.find_root(&polynomial, self.initial_guess)?;
        if root <= 0.0 {
            debug!(root, "양수가 아닌 성장 계수");
            return Err(FolioError::NonConvergence { iterations: 0 });
        }

        let periods_per_year = Duration::days(365).num_milliseconds() as f64
            / schedule.period().num_milliseconds() as f64;
        let annual = root.powf(periods_per_year) - 1.0;
        decimal_from_f64(annual).ok_or(FolioError::NonConvergence { iterations: 0 })
    }
}
