//! Standalone background job CLI.

use chrono::Utc;
use clap::{Parser, Subcommand};
use folio_collector::source::{PriceSource, YahooPriceSource};
use folio_collector::store::InMemoryStore;
use folio_collector::{modules, CollectorConfig};
use folio_core::logging::{init_logging, LogConfig, LogFormat};
use folio_core::EngineConfig;

#[derive(Parser)]
#[command(name = "folio-collector")]
#[command(about = "Folio background jobs (price backfill, split replay)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 생략하면 엔진 설정 파일의 값을 사용
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact). 생략하면 엔진 설정 파일의 값을 사용
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// 작업 span 진입/종료 로그 출력
    #[arg(long)]
    log_spans: bool,

    /// 엔진 설정 파일 경로
    #[arg(long, default_value = "config/folio.toml")]
    engine_config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 누락 가격 보충
    BackfillPrices {
        /// 특정 종목만 보충 (쉼표로 구분, 예: "AAPL,005930")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 처리 대기 중인 주식 분할 재적용
    ReplaySplits,

    /// 전체 워크플로우 실행 (분할 재적용 → 가격 보충)
    RunAll,

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    let engine_config = EngineConfig::load(&cli.engine_config)?;
    let mut log_config = LogConfig::from_config(&engine_config.logging);
    if let Some(level) = &cli.log_level {
        log_config.level = format!("folio_collector={level},folio_core={level}", level = level);
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(log_config.with_span_events(cli.log_spans))?;

    tracing::info!("Folio Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(store_path = %config.store_path.display(), "설정 로드 완료");

    let store = InMemoryStore::load(&config.store_path).await?;

    // 가격 소스 연결 실패 시 직전 가격 유지만 수행
    let yahoo = if config.backfill.fetch_remote {
        match YahooPriceSource::new() {
            Ok(source) => Some(source),
            Err(e) => {
                tracing::warn!(error = %e, "가격 소스 초기화 실패, 직전 가격 유지만 수행");
                None
            }
        }
    } else {
        None
    };
    let source = yahoo.as_ref().map(|s| s as &dyn PriceSource);

    // 명령 실행
    match cli.command {
        Commands::BackfillPrices { symbols } => {
            let stats =
                modules::backfill_prices(&store, source, &config, symbols, Utc::now()).await?;
            stats.log_summary("가격 보충");
            store.save(&config.store_path).await?;
        }
        Commands::ReplaySplits => {
            let stats = modules::replay_splits(&store).await?;
            stats.log_summary("분할 재적용");
            store.save(&config.store_path).await?;
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");

            // 1. 분할 재적용 (보충 전에 과거 가격 기준을 맞춘다)
            tracing::info!("Step 1/2: 분할 재적용");
            let split_stats = modules::replay_splits(&store).await?;
            split_stats.log_summary("분할 재적용");

            // 2. 가격 보충
            tracing::info!("Step 2/2: 가격 보충");
            let backfill_stats =
                modules::backfill_prices(&store, source, &config, None, Utc::now()).await?;
            backfill_stats.log_summary("가격 보충");

            store.save(&config.store_path).await?;
            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 워크플로우 실행 시작 ===");

                        // 1. 분할 재적용
                        match modules::replay_splits(&store).await {
                            Ok(stats) => stats.log_summary("분할 재적용"),
                            Err(e) => tracing::error!("분할 재적용 실패: {}", e),
                        }

                        // 2. 가격 보충
                        match modules::backfill_prices(&store, source, &config, None, Utc::now()).await {
                            Ok(stats) => stats.log_summary("가격 보충"),
                            Err(e) => tracing::error!("가격 보충 실패: {}", e),
                        }

                        if let Err(e) = store.save(&config.store_path).await {
                            tracing::error!("저장소 저장 실패: {}", e);
                        }

                        tracing::info!(
                            "=== 워크플로우 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    tracing::info!("Folio Collector 종료");

    Ok(())
}
