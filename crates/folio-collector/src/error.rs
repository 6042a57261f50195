//! 에러 타입 정의.

use folio_core::FolioError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 저장소 에러
    #[error("Store error: {0}")]
    Store(String),
    /// 가격 소스 에러 (Yahoo 등)
    #[error("Price source error: {0}")]
    Source(String),
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
    /// 평가 엔진 에러
    #[error("Engine error: {0}")]
    Engine(#[from] FolioError),
    /// 파일 입출력 에러
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// 스냅샷 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
