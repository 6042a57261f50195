//! 백그라운드 작업 모듈.

pub mod price_backfill;
pub mod split_replay;

pub use price_backfill::{backfill_instrument, backfill_prices, BackfillOutcome};
pub use split_replay::{replay_split, replay_splits};
