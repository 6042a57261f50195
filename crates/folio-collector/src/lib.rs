//! Standalone background jobs for the Folio valuation engine.
//!
//! 이 crate는 차트 계산과 독립적으로 저장된 데이터를 정비하는 바이너리를 제공합니다:
//! - 가격 보충 (누락 구간 탐지 → 가격 소스 조회 → 직전 가격 유지)
//! - 주식 분할 재적용 (적용 및 되돌리기)

pub mod config;
pub mod error;
pub mod gaps;
pub mod modules;
pub mod source;
pub mod stats;
pub mod store;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
