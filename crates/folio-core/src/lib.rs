//! # Folio Core
//!
//! 개인 투자 추적 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 평가 엔진과 백그라운드 작업 전반에서 사용되는 기본 타입을 제공합니다:
//! - 가격 샘플 및 가격 시계열
//! - 거래 원장 (시간순 정렬 보장)
//! - 날짜 범위 및 집계 주기
//! - 주식 분할 비율 및 처리 상태
//! - 통화 변환 인터페이스
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
