//! 가격/거래 시계열을 버킷 시퀀스와 병합하는 시리즈 생성기.
//!
//! 생성기는 전진 전용 커서를 유지하며 버킷을 시간순으로 한 번만 순회합니다.
//! 전체 비용은 O(가격 + 거래 + 버킷)입니다. 버킷은 반드시 시간순으로 전달되어야 합니다.

mod cursor;
mod instrument;
mod position;

pub use cursor::{PriceCursor, TransactionCursor};
pub use instrument::{InstrumentPointGenerator, InstrumentSnapshot};
pub use position::PositionPointGenerator;
