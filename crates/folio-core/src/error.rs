//! 평가 엔진의 에러 타입.
//!
//! 이 모듈은 계산 및 백그라운드 작업 전반에서 사용되는 에러 타입을 정의합니다.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// 핵심 평가 엔진 에러.
#[derive(Debug, Error)]
pub enum FolioError {
    /// 요청 시점에 가격/거래 데이터가 없음
    #[error("데이터 없음: {0}")]
    NoData(String),

    /// 적용 가능한 환율 없음
    #[error("환율 없음: {from} -> {to} ({at})")]
    MissingExchangeRate {
        from: String,
        to: String,
        at: DateTime<Utc>,
    },

    /// 근 탐색이 수렴하지 않음
    #[error("수렴 실패: {iterations}회 반복 후 종료")]
    NonConvergence { iterations: usize },

    /// 잘못된 날짜 범위 (from > to)
    #[error("잘못된 범위: {from} > {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 평가 작업을 위한 Result 타입.
pub type FolioResult<T> = Result<T, FolioError>;

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for FolioError {
    fn from(err: config::ConfigError) -> Self {
        FolioError::Config(err.to_string())
    }
}
