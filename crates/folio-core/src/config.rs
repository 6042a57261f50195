//! 설정 관리.
//!
//! 평가 엔진(차트 생성, 근 탐색)과 로깅 설정을 정의합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FolioResult;

/// 엔진 전체 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 차트 생성 설정
    #[serde(default)]
    pub chart: ChartConfig,
    /// 수익률(IRR) 근 탐색 설정
    #[serde(default)]
    pub solver: SolverConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 차트 생성 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartConfig {
    /// 차트 한 개에 생성할 최대 포인트 수
    pub max_points: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { max_points: 500 }
    }
}

/// Newton-Raphson 근 탐색 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverConfig {
    /// 연속된 근의 차이가 이 값보다 작으면 수렴으로 판단
    pub precision: f64,
    /// 최대 반복 횟수
    pub max_iterations: usize,
    /// 초기 추정값 (기간 성장 계수, 1.0 = 수익률 0%)
    pub initial_guess: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            precision: 1e-10,
            max_iterations: 100,
            initial_guess: 1.0,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl EngineConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 `FOLIO__` 접두사 환경 변수만 사용합니다.
    /// 예: `FOLIO__CHART__MAX_POINTS=300`
    pub fn load<P: AsRef<Path>>(path: P) -> FolioResult<Self> {
        let defaults = EngineConfig::default();
        let builder = config::Config::builder()
            .set_default("chart.max_points", defaults.chart.max_points as i64)?
            .set_default("solver.precision", defaults.solver.precision)?
            .set_default("solver.max_iterations", defaults.solver.max_iterations as i64)?
            .set_default("solver.initial_guess", defaults.solver.initial_guess)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FOLIO")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.chart.max_points, 500);
        assert_eq!(config.solver.max_iterations, 100);
        assert_eq!(config.solver.initial_guess, 1.0);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = EngineConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.chart.max_points, 500);
        assert!(config.solver.precision > 0.0);
    }
}
