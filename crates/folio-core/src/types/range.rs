//! 날짜 범위 타입.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FolioError, FolioResult};

/// `from <= to`가 보장되는 날짜 범위.
///
/// 버킷으로 사용될 때는 `(from, to]` 의미이며, 버킷의 대표 시점은 `to`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateRange {
    /// 새 범위를 생성합니다. `from > to`이면 `InvalidRange`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> FolioResult<Self> {
        if from > to {
            return Err(FolioError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// 폭이 0인 범위 (`from == to == at`).
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { from: at, to: at }
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// 폐구간 `[from, to]` 포함 여부.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }

    /// 시작 시점을 `at`으로 당긴 범위를 반환합니다 (`at`은 `to`를 넘지 않도록 잘림).
    pub fn clip_from(&self, at: DateTime<Utc>) -> Self {
        let from = at.max(self.from).min(self.to);
        Self { from, to: self.to }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} ~ {}]", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

/// 지정된 밀도로 채워야 하는 누락 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingRange {
    /// 구간 시작 (기존 샘플 또는 전체 범위 시작)
    pub from: DateTime<Utc>,
    /// 구간 끝 (기존 샘플 또는 전체 범위 끝)
    pub to: DateTime<Utc>,
    /// 이 구간에 요구되는 샘플 간격
    pub interval: Duration,
}

impl MissingRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>, interval: Duration) -> Self {
        Self { from, to, interval }
    }

    /// 범위 타입으로 변환합니다.
    pub fn as_date_range(&self) -> DateRange {
        DateRange {
            from: self.from.min(self.to),
            to: self.to.max(self.from),
        }
    }
}
