//! 다항식과 Newton-Raphson 근 탐색.

use folio_core::{FolioError, FolioResult, SolverConfig};

/// 밀집 계수 배열로 표현한 다항식.
///
/// `coefficients[k]`는 `x^k`의 계수이며 등록되지 않은 차수는 0입니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new() -> Self {
        Self::default()
    }

    /// `value · x^power` 항을 더합니다. 같은 차수는 누적됩니다.
    pub fn add_term(&mut self, power: usize, value: f64) {
        if self.coefficients.len() <= power {
            self.coefficients.resize(power + 1, 0.0);
        }
        self.coefficients[power] += value;
    }

    /// 빌더 스타일 항 추가.
    pub fn with_term(mut self, power: usize, value: f64) -> Self {
        self.add_term(power, value);
        self
    }

    pub fn coefficient(&self, power: usize) -> f64 {
        self.coefficients.get(power).copied().unwrap_or(0.0)
    }

    /// 등록된 최고 차수.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| *c == 0.0)
    }

    /// Horner 방식으로 `f(x)`를 계산합니다.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }

    /// `f'(x)`를 계산합니다.
    pub fn derivative_at(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (k, c)| acc * x + c * k as f64)
    }
}

/// Newton-Raphson 근 탐색기.
#[derive(Debug, Clone, Copy)]
pub struct RootFinder {
    precision: f64,
    max_iterations: usize,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl RootFinder {
    pub fn new(precision: f64, max_iterations: usize) -> Self {
        Self {
            precision,
            max_iterations,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.precision, config.max_iterations)
    }

    /// `x_{n+1} = x_n - f(x_n) / f'(x_n)`를 반복합니다.
    ///
    /// 연속된 근의 차이가 `precision`보다 작아지면 수렴으로 봅니다.
    /// 도함수가 0이 되거나 값이 발산하거나 반복 한도를 넘으면 `NonConvergence`.
    pub fn find_root(&self, polynomial: &Polynomial, initial_guess: f64) -> FolioResult<f64> {
        let mut x = initial_guess;
        for iteration in 0..self.max_iterations {
            let fx = polynomial.evaluate(x);
            let dfx = polynomial.derivative_at(x);
            if dfx == 0.0 || !dfx.is_finite() || !fx.is_finite() {
                return Err(FolioError::NonConvergence {
                    iterations: iteration,
                });
            }

            let next = x - fx / dfx;
            if !next.is_finite() {
                return Err(FolioError::NonConvergence {
                    iterations: iteration + 1,
                });
            }
            if (next - x).abs() < self.precision {
                return Ok(next);
            }
            x = next;
        }

        Err(FolioError::NonConvergence {
            iterations: self.max_iterations,
        })
    }
}
