//! 평가 엔진 전반에서 사용되는 공통 타입.

mod decimal;
mod frequency;
mod range;

pub use decimal::*;
pub use frequency::*;
pub use range::*;
