//! JSON 스냅샷 기반 메모리 저장소.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::{
    DateRange, Instrument, Position, PriceSample, PriceSeries, PriceTracking,
    SplitProcessingState, StockSplit,
};

use super::{PortfolioStore, SplitCommit};
use crate::error::CollectorError;
use crate::Result;

/// 저장소 전체 상태 (파일에 그대로 직렬화됩니다).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub prices: HashMap<Uuid, PriceSeries>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub splits: Vec<StockSplit>,
}

/// 메모리 저장소.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// 스냅샷 파일을 읽습니다. 파일이 없으면 빈 저장소를 반환합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)?;
                tracing::info!(
                    path = %path.display(),
                    instruments = snapshot.instruments.len(),
                    splits = snapshot.splits.len(),
                    "저장소 로드 완료"
                );
                Ok(Self::from_snapshot(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "저장소 파일 없음, 빈 저장소로 시작");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 현재 상태를 스냅샷 파일로 저장합니다.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&*state)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;

        tracing::debug!(path = %path.display(), "저장소 저장 완료");
        Ok(())
    }

    /// 현재 상태의 복사본.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    pub async fn add_instrument(&self, instrument: Instrument) {
        self.state.write().await.instruments.push(instrument);
    }

    pub async fn add_position(&self, position: Position) {
        self.state.write().await.positions.push(position);
    }

    pub async fn add_split(&self, split: StockSplit) {
        self.state.write().await.splits.push(split);
    }

    /// 종목의 전체 가격 시계열.
    pub async fn price_series(&self, instrument_id: Uuid) -> PriceSeries {
        self.state
            .read()
            .await
            .prices
            .get(&instrument_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PortfolioStore for InMemoryStore {
    async fn list_instruments(&self) -> Result<Vec<Instrument>> {
        Ok(self.state.read().await.instruments.clone())
    }

    async fn load_prices(&self, instrument_id: Uuid, range: DateRange) -> Result<Vec<PriceSample>> {
        let state = self.state.read().await;
        Ok(state
            .prices
            .get(&instrument_id)
            .map(|series| series.range(range.from(), range.to()).to_vec())
            .unwrap_or_default())
    }

    async fn price_at(
        &self,
        instrument_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<PriceSample>> {
        let state = self.state.read().await;
        Ok(state
            .prices
            .get(&instrument_id)
            .and_then(|series| series.price_at(at).copied()))
    }

    async fn upsert_prices(&self, instrument_id: Uuid, samples: Vec<PriceSample>) -> Result<usize> {
        let mut state = self.state.write().await;
        let series = state.prices.entry(instrument_id).or_default();
        Ok(samples
            .into_iter()
            .filter(|sample| series.upsert(*sample))
            .count())
    }

    async fn update_price_tracking(
        &self,
        instrument_id: Uuid,
        tracking: PriceTracking,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let instrument = state
            .instruments
            .iter_mut()
            .find(|i| i.id == instrument_id)
            .ok_or_else(|| CollectorError::Store(format!("unknown instrument {}", instrument_id)))?;
        instrument.tracking = tracking;
        Ok(())
    }

    async fn list_positions(&self, instrument_id: Uuid) -> Result<Vec<Position>> {
        let state = self.state.read().await;
        Ok(state
            .positions
            .iter()
            .filter(|p| p.instrument_id == instrument_id)
            .cloned()
            .collect())
    }

    async fn list_splits(&self) -> Result<Vec<StockSplit>> {
        let mut splits = self.state.read().await.splits.clone();
        splits.sort_by_key(|s| s.effective_at);
        Ok(splits)
    }

    async fn update_split_state(&self, split_id: Uuid, state: SplitProcessingState) -> Result<()> {
        let mut guard = self.state.write().await;
        let split = guard
            .splits
            .iter_mut()
            .find(|s| s.id == split_id)
            .ok_or_else(|| CollectorError::Store(format!("unknown split {}", split_id)))?;
        split.state = state;
        Ok(())
    }

    async fn commit_split_adjustment(&self, commit: SplitCommit) -> Result<()> {
        let mut guard = self.state.write().await;

        // 검증을 모두 마친 뒤에만 쓴다
        let split_index = guard
            .splits
            .iter()
            .position(|s| s.id == commit.split_id)
            .ok_or_else(|| CollectorError::Store(format!("unknown split {}", commit.split_id)))?;
        let current = guard.splits[split_index].state;
        if current != commit.expected {
            return Err(CollectorError::Store(format!(
                "split {} state changed: expected {}, found {}",
                commit.split_id, commit.expected, current
            )));
        }
        if let Some(stray) = commit
            .positions
            .iter()
            .find(|p| p.instrument_id != commit.instrument_id)
        {
            return Err(CollectorError::Store(format!(
                "position {} does not belong to instrument {}",
                stray.id, commit.instrument_id
            )));
        }

        if !commit.prices.is_empty() {
            let series = guard.prices.entry(commit.instrument_id).or_default();
            for sample in commit.prices {
                series.upsert(sample);
            }
        }
        for position in commit.positions {
            match guard.positions.iter_mut().find(|p| p.id == position.id) {
                Some(existing) => *existing = position,
                None => guard.positions.push(position),
            }
        }
        guard.splits[split_index].state = commit.next;

        Ok(())
    }
}
