//! 투자 추적을 위한 도메인 모델.

mod currency;
mod instrument;
mod price;
mod split;
mod transaction;

pub use currency::*;
pub use instrument::*;
pub use price::*;
pub use split::*;
pub use transaction::*;
