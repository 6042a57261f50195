//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// JSON 스냅샷 저장소 경로
    pub store_path: PathBuf,
    /// 가격 보충 설정
    pub backfill: BackfillConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 가격 보충(누락 구간 탐지 + 채우기) 설정
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// 점검할 과거 기간 (일)
    pub lookback_days: i64,
    /// 가격 소스 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 누락 구간을 가격 소스에서 먼저 조회할지 여부
    pub fetch_remote: bool,
    /// 샘플링 밀도 단계
    pub tiers: IntervalTierConfig,
}

/// 기준 시각으로부터의 거리별 요구 샘플 간격
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTierConfig {
    /// 촘촘한 구간 범위 (시간)
    pub fine_within_hours: i64,
    /// 촘촘한 구간 간격 (분)
    pub fine_interval_minutes: i64,
    /// 중간 구간 범위 (시간)
    pub medium_within_hours: i64,
    /// 중간 구간 간격 (분)
    pub medium_interval_minutes: i64,
    /// 그 밖의 구간 간격 (분)
    pub coarse_interval_minutes: i64,
}

impl Default for IntervalTierConfig {
    fn default() -> Self {
        Self {
            fine_within_hours: 24,
            fine_interval_minutes: 5,
            medium_within_hours: 24 * 5,
            medium_interval_minutes: 60,
            coarse_interval_minutes: 60 * 24,
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            request_delay_ms: 500,
            fetch_remote: true,
            tiers: IntervalTierConfig::default(),
        }
    }
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = IntervalTierConfig::default();
        let config = Self {
            store_path: std::env::var("FOLIO_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/folio.json")),
            backfill: BackfillConfig {
                lookback_days: env_var_parse("BACKFILL_LOOKBACK_DAYS", 30),
                request_delay_ms: env_var_parse("BACKFILL_REQUEST_DELAY_MS", 500),
                fetch_remote: env_var_bool("BACKFILL_FETCH_REMOTE", true),
                tiers: IntervalTierConfig {
                    fine_within_hours: env_var_parse(
                        "BACKFILL_FINE_WITHIN_HOURS",
                        defaults.fine_within_hours,
                    ),
                    fine_interval_minutes: env_var_parse(
                        "BACKFILL_FINE_INTERVAL_MINUTES",
                        defaults.fine_interval_minutes,
                    ),
                    medium_within_hours: env_var_parse(
                        "BACKFILL_MEDIUM_WITHIN_HOURS",
                        defaults.medium_within_hours,
                    ),
                    medium_interval_minutes: env_var_parse(
                        "BACKFILL_MEDIUM_INTERVAL_MINUTES",
                        defaults.medium_interval_minutes,
                    ),
                    coarse_interval_minutes: env_var_parse(
                        "BACKFILL_COARSE_INTERVAL_MINUTES",
                        defaults.coarse_interval_minutes,
                    ),
                },
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<()> {
        if self.backfill.lookback_days <= 0 {
            return Err(CollectorError::Config(
                "BACKFILL_LOOKBACK_DAYS는 양수여야 합니다".to_string(),
            ));
        }
        let tiers = &self.backfill.tiers;
        if tiers.fine_interval_minutes <= 0
            || tiers.medium_interval_minutes <= 0
            || tiers.coarse_interval_minutes <= 0
        {
            return Err(CollectorError::Config(
                "샘플 간격은 양수여야 합니다".to_string(),
            ));
        }
        if tiers.fine_within_hours > tiers.medium_within_hours {
            return Err(CollectorError::Config(
                "촘촘한 구간 범위가 중간 구간 범위보다 깁니다".to_string(),
            ));
        }
        if self.daemon.interval_minutes == 0 {
            return Err(CollectorError::Config(
                "DAEMON_INTERVAL_MINUTES는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/folio.json"),
            backfill: BackfillConfig::default(),
            daemon: DaemonConfig {
                interval_minutes: 60,
            },
        }
    }
}

impl BackfillConfig {
    /// 가격 소스 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 점검 기간을 chrono Duration으로 반환
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookback_days)
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
