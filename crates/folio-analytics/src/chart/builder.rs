use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use folio_core::{
    CurrencyConverter, DateRange, EngineConfig, FolioError, FolioResult, Instrument, Position,
    Price, PriceSeries, TimePoint, TransactionLedger,
};

use super::{ChartMetric, ChartMode, ChartRequest};
use crate::bucket::RangeBucketizer;
use crate::irr::{CashFlowSchedule, MoneyWeightedReturn};
use crate::series::{InstrumentPointGenerator, PositionPointGenerator};
use crate::valuation::{self, PositionSnapshot, RangeBreakdown};

/// 포지션 차트의 입력 한 건 (포지션 + 종목 가격 시계열).
#[derive(Debug, Clone, Copy)]
pub struct Holding<'a> {
    /// 종목 통화
    pub currency: &'a str,
    /// 종목 가격 시계열
    pub prices: &'a PriceSeries,
    /// 포지션 거래 원장
    pub transactions: &'a TransactionLedger,
}

impl<'a> Holding<'a> {
    pub fn new(instrument: &'a Instrument, prices: &'a PriceSeries, position: &'a Position) -> Self {
        Self {
            currency: &instrument.currency,
            prices,
            transactions: &position.transactions,
        }
    }
}

/// 차트 시리즈 빌더.
///
/// 요청마다 독립적으로 동작하며 내부 상태를 바꾸지 않습니다.
pub struct ChartSeriesBuilder<'c> {
    bucketizer: RangeBucketizer,
    returns: MoneyWeightedReturn,
    converter: &'c dyn CurrencyConverter,
}

impl<'c> ChartSeriesBuilder<'c> {
    pub fn new(config: &EngineConfig, converter: &'c dyn CurrencyConverter) -> Self {
        Self {
            bucketizer: RangeBucketizer::from_config(&config.chart),
            returns: MoneyWeightedReturn::from_config(&config.solver),
            converter,
        }
    }

    /// 종목 차트 (가격, 손익, 수익률).
    pub fn instrument_series(
        &self,
        request: &ChartRequest,
        instrument: &Instrument,
        prices: &PriceSeries,
    ) -> FolioResult<Vec<TimePoint>> {
        if !request.metric.supports_instrument() {
            return Err(FolioError::InvalidInput(format!(
                "종목 차트에서 지원하지 않는 지표: {}",
                request.metric
            )));
        }

        let Some(buckets) = self.plan(request, prices.first().map(|s| s.time))? else {
            debug!(symbol = %instrument.symbol, "가격 데이터 없음");
            return Ok(Vec::new());
        };
        debug!(
            symbol = %instrument.symbol,
            metric = %request.metric,
            buckets = buckets.len(),
            "종목 차트 생성"
        );

        let anchor_time = buckets[0].to();
        let target = request.currency.as_deref();
        let mut generator = InstrumentPointGenerator::new(prices.as_slice());
        let mut anchor: Option<Price> = None;
        let mut points = Vec::with_capacity(buckets.len());

        for bucket in &buckets {
            let Some(snapshot) = generator.snapshot(bucket) else {
                continue;
            };
            let anchor_price = *anchor.get_or_insert(snapshot.price_at_end);
            let (start, start_time) = match request.mode {
                ChartMode::Cumulative => (anchor_price, anchor_time),
                ChartMode::PerBucket => (snapshot.price_at_start, bucket.from()),
            };

            let end = self.convert(snapshot.price_at_end, &instrument.currency, target, bucket.to())?;
            let value = match request.metric {
                ChartMetric::Price => end,
                ChartMetric::Profit | ChartMetric::Performance => {
                    let start = self.convert(start, &instrument.currency, target, start_time)?;
                    if request.metric == ChartMetric::Profit {
                        valuation::profit(start, end)
                    } else {
                        valuation::performance(start, end)
                    }
                }
                other => {
                    return Err(FolioError::InvalidInput(format!(
                        "종목 차트에서 지원하지 않는 지표: {}",
                        other
                    )))
                }
            };
            points.push(TimePoint::new(bucket.to(), value));
        }

        Ok(points)
    }

    /// 포지션 차트. 여러 포지션을 넘기면 합산합니다.
    pub fn position_series(
        &self,
        request: &ChartRequest,
        holdings: &[Holding<'_>],
    ) -> FolioResult<Vec<TimePoint>> {
        if !request.metric.supports_positions() {
            return Err(FolioError::InvalidInput(format!(
                "포지션 차트에서 지원하지 않는 지표: {}",
                request.metric
            )));
        }

        let first_transaction = holdings
            .iter()
            .filter_map(|h| h.transactions.first().map(|t| t.time))
            .min();
        let Some(buckets) = self.plan(request, first_transaction)? else {
            debug!(holdings = holdings.len(), "거래 데이터 없음");
            return Ok(Vec::new());
        };
        debug!(
            holdings = holdings.len(),
            metric = %request.metric,
            mode = ?request.mode,
            buckets = buckets.len(),
            "포지션 차트 생성"
        );

        let snapshots: Vec<Vec<Option<PositionSnapshot<'_>>>> = holdings
            .iter()
            .map(|h| {
                PositionPointGenerator::new(h.prices.as_slice(), h.transactions.as_slice())
                    .generate(&buckets)
            })
            .collect();
        let anchors: Vec<Option<Price>> = snapshots
            .iter()
            .map(|s| s.first().copied().flatten().map(|s| s.price_at_end))
            .collect();

        let anchor_time = buckets[0].to();
        let mut points = Vec::with_capacity(buckets.len());

        for (idx, bucket) in buckets.iter().enumerate() {
            let mut inputs = Vec::with_capacity(holdings.len());
            for (h, holding) in holdings.iter().enumerate() {
                if let Some(snapshot) = snapshots[h][idx] {
                    let snapshot = match request.mode {
                        ChartMode::Cumulative => snapshot
                            .with_start_price(anchors[h].unwrap_or(snapshot.seed_price)),
                        ChartMode::PerBucket => snapshot,
                    };
                    inputs.push((holding, snapshot));
                }
            }
            if inputs.is_empty() {
                continue;
            }

            let from = match request.mode {
                ChartMode::Cumulative => anchor_time,
                ChartMode::PerBucket => bucket.from(),
            };
            let value = self.position_value(request, &inputs, from, bucket.to())?;
            points.push(TimePoint::new(bucket.to(), value));
        }

        Ok(points)
    }

    fn position_value(
        &self,
        request: &ChartRequest,
        inputs: &[(&Holding<'_>, PositionSnapshot<'_>)],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> FolioResult<Decimal> {
        let target = request.currency.as_deref();
        match request.metric {
            ChartMetric::Value => {
                let mut total = Decimal::ZERO;
                for (holding, snapshot) in inputs {
                    let value = valuation::value(std::slice::from_ref(snapshot), to);
                    total += self.convert(value, holding.currency, target, to)?;
                }
                Ok(total)
            }
            ChartMetric::Profit => Ok(self.breakdown(inputs, target, from, to)?.profit()),
            ChartMetric::Performance => Ok(self.breakdown(inputs, target, from, to)?.performance()),
            ChartMetric::BreakEvenPoint => {
                let mut notional = Decimal::ZERO;
                let mut quantity = Decimal::ZERO;
                for (holding, snapshot) in inputs {
                    for transaction in snapshot.transactions {
                        notional += self.convert(
                            transaction.notional(),
                            holding.currency,
                            target,
                            transaction.time,
                        )?;
                        quantity += transaction.amount;
                    }
                }
                if quantity.is_zero() {
                    Ok(Decimal::ZERO)
                } else {
                    Ok(notional / quantity)
                }
            }
            ChartMetric::MoneyWeightedReturn => self.money_weighted(inputs, target, from, to),
            ChartMetric::Price => Err(FolioError::InvalidInput(format!(
                "포지션 차트에서 지원하지 않는 지표: {}",
                request.metric
            ))),
        }
    }

    fn breakdown(
        &self,
        inputs: &[(&Holding<'_>, PositionSnapshot<'_>)],
        target: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> FolioResult<RangeBreakdown> {
        let mut total = RangeBreakdown::default();
        for (holding, snapshot) in inputs {
            total += RangeBreakdown::from_snapshot(snapshot, from, to)
                .try_map(|amount| self.convert(amount, holding.currency, target, to))?;
        }
        Ok(total)
    }

    fn money_weighted(
        &self,
        inputs: &[(&Holding<'_>, PositionSnapshot<'_>)],
        target: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> FolioResult<Decimal> {
        if from >= to {
            return Ok(Decimal::ZERO);
        }

        let mut schedule = CashFlowSchedule::daily(DateRange::new(from, to)?);
        for (holding, snapshot) in inputs {
            schedule.add_position_with(
                snapshot.transactions,
                snapshot.price_at_start,
                snapshot.price_at_end,
                |amount, at| self.convert(amount, holding.currency, target, at),
            )?;
        }

        match self.returns.annualized(&schedule) {
            Ok(rate) => Ok(rate),
            Err(FolioError::NonConvergence { iterations }) => {
                warn!(
                    iterations,
                    from = %from,
                    to = %to,
                    "금액 가중 수익률 수렴 실패, 단순 수익률로 대체"
                );
                Ok(self.breakdown(inputs, target, from, to)?.performance())
            }
            Err(e) => Err(e),
        }
    }

    /// 데이터가 시작되는 시각으로 범위를 당긴 뒤 버킷을 만듭니다.
    ///
    /// 첫 버킷은 차트 시작 시점의 폭 0 버킷이며, 누적 지표의 기준점이 됩니다.
    fn plan(
        &self,
        request: &ChartRequest,
        first_data: Option<DateTime<Utc>>,
    ) -> FolioResult<Option<Vec<DateRange>>> {
        let Some(first) = first_data else {
            return Ok(None);
        };
        if first > request.range.to() {
            return Ok(None);
        }

        let clipped = request.range.clip_from(first);
        let plan = self
            .bucketizer
            .bucketize(clipped.from(), clipped.to(), request.frequency)?;

        let mut buckets = Vec::with_capacity(plan.len() + 1);
        buckets.push(DateRange::instant(plan.from));
        if plan.from < plan.to {
            buckets.extend(plan.buckets);
        }
        Ok(Some(buckets))
    }

    fn convert(
        &self,
        amount: Decimal,
        currency: &str,
        target: Option<&str>,
        at: DateTime<Utc>,
    ) -> FolioResult<Decimal> {
        match target {
            Some(target) if !target.eq_ignore_ascii_case(currency) => {
                self.converter.convert(amount, currency, target, at)
            }
            _ => Ok(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use folio_core::{AggregationFrequency, IdentityConverter, PriceSample, Transaction};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn prices() -> PriceSeries {
        PriceSeries::from_samples(
            (0..10)
                .map(|n| PriceSample::new(day(n), Decimal::from(100 + n * 10)))
                .collect(),
        )
    }

    #[test]
    fn test_instrument_price_chart_is_clipped_to_first_price() {
        let converter = IdentityConverter;
        let builder = ChartSeriesBuilder::new(&EngineConfig::default(), &converter);
        let instrument = Instrument::new("ACME", "USD");
        let request = ChartRequest::new(
            DateRange::new(day(-5), day(3)).unwrap(),
            AggregationFrequency::Day,
            ChartMetric::Price,
        );

        let points = builder
            .instrument_series(&request, &instrument, &prices())
            .unwrap();
        let values: Vec<_> = points.iter().map(|p| p.value).collect();
        assert_eq!(points[0].time, day(0));
        assert_eq!(values, vec![dec!(100), dec!(110), dec!(120), dec!(130)]);
    }

    #[test]
    fn test_instrument_profit_modes() {
        let converter = IdentityConverter;
        let builder = ChartSeriesBuilder::new(&EngineConfig::default(), &converter);
        let instrument = Instrument::new("ACME", "USD");
        let range = DateRange::new(day(0), day(2)).unwrap();

        let cumulative = ChartRequest::new(range, AggregationFrequency::Day, ChartMetric::Profit);
        let values: Vec<_> = builder
            .instrument_series(&cumulative, &instrument, &prices())
            .unwrap()
            .into_iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![dec!(0), dec!(10), dec!(20)]);

        let per_bucket = cumulative.with_mode(ChartMode::PerBucket);
        let values: Vec<_> = builder
            .instrument_series(&per_bucket, &instrument, &prices())
            .unwrap()
            .into_iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![dec!(0), dec!(10), dec!(10)]);
    }

    #[test]
    fn test_unsupported_metric_rejected() {
        let converter = IdentityConverter;
        let builder = ChartSeriesBuilder::new(&EngineConfig::default(), &converter);
        let instrument = Instrument::new("ACME", "USD");
        let request = ChartRequest::new(
            DateRange::new(day(0), day(2)).unwrap(),
            AggregationFrequency::Day,
            ChartMetric::Value,
        );
        assert!(matches!(
            builder.instrument_series(&request, &instrument, &prices()),
            Err(FolioError::InvalidInput(_))
        ));

        let request = ChartRequest::new(
            DateRange::new(day(0), day(2)).unwrap(),
            AggregationFrequency::Day,
            ChartMetric::Price,
        );
        assert!(matches!(
            builder.position_series(&request, &[]),
            Err(FolioError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_position_value_and_profit() {
        let converter = IdentityConverter;
        let builder = ChartSeriesBuilder::new(&EngineConfig::default(), &converter);
        let instrument = Instrument::new("ACME", "USD");
        let prices = prices();
        let position = Position::new(instrument.id).with_transactions(
            TransactionLedger::from_transactions(vec![
                Transaction::buy(day(1), dec!(2), dec!(110)),
                Transaction::sell(day(3), dec!(1), dec!(130)),
            ]),
        );
        let holdings = [Holding::new(&instrument, &prices, &position)];
        let range = DateRange::new(day(0), day(4)).unwrap();

        let value = ChartRequest::new(range, AggregationFrequency::Day, ChartMetric::Value);
        let values: Vec<_> = builder
            .position_series(&value, &holdings)
            .unwrap()
            .into_iter()
            .map(|p| (p.time, p.value))
            .collect();
        assert_eq!(
            values,
            vec![
                (day(1), dec!(220)),
                (day(2), dec!(240)),
                (day(3), dec!(130)),
                (day(4), dec!(140)),
            ]
        );

        let profit = ChartRequest::new(range, AggregationFrequency::Day, ChartMetric::Profit);
        let values: Vec<_> = builder
            .position_series(&profit, &holdings)
            .unwrap()
            .into_iter()
            .map(|p| p.value)
            .collect();
        // 시작점 0, 이후 (평가액 + 매도 대금 - 매수 대금)
        assert_eq!(values, vec![dec!(0), dec!(20), dec!(40), dec!(50)]);
    }
}
