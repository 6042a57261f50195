//! Yahoo Finance 가격 소스.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use time::OffsetDateTime;
use tracing::debug;

use folio_core::{decimal_from_f64, AggregationFrequency, DateRange, Instrument, PriceSample};

use super::PriceSource;
use crate::error::CollectorError;
use crate::Result;

/// Yahoo Finance 종가 조회.
pub struct YahooPriceSource {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooPriceSource {
    pub fn new() -> Result<Self> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CollectorError::Source(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        range: DateRange,
        granularity: AggregationFrequency,
    ) -> Result<Vec<PriceSample>> {
        let symbol = to_yahoo_symbol(&instrument.symbol, &instrument.currency);
        let interval = yahoo_interval(granularity);
        let start = to_offset_datetime(range.from())?;
        let end = to_offset_datetime(range.to())?;

        debug!(
            symbol = %symbol,
            interval = interval,
            from = %range.from(),
            to = %range.to(),
            "Yahoo Finance API 날짜 범위 호출"
        );

        let response = self
            .connector
            .get_quote_history_interval(&symbol, start, end, interval)
            .await
            .map_err(|e| {
                CollectorError::Source(format!("Yahoo Finance API 오류 ({}): {}", symbol, e))
            })?;

        let quotes = response
            .quotes()
            .map_err(|e| CollectorError::Source(format!("Quote 파싱 오류: {}", e)))?;

        let mut samples: Vec<PriceSample> = quotes
            .iter()
            .filter_map(|q| {
                let time = Utc.timestamp_opt(q.timestamp as i64, 0).single()?;
                let price = decimal_from_f64(q.close)?;
                (price > rust_decimal::Decimal::ZERO && range.contains(time))
                    .then(|| PriceSample::new(time, price))
            })
            .collect();
        samples.sort_by_key(|s| s.time);
        samples.dedup_by_key(|s| s.time);

        Ok(samples)
    }
}

/// 집계 주기를 Yahoo interval 문자열로 변환.
fn yahoo_interval(granularity: AggregationFrequency) -> &'static str {
    match granularity {
        AggregationFrequency::FiveMinutes => "5m",
        AggregationFrequency::Hour => "1h",
        AggregationFrequency::Day => "1d",
        AggregationFrequency::Week => "1wk",
        AggregationFrequency::Month => "1mo",
        // 연 단위 간격이 없으므로 월봉을 받아 연 버킷으로 집계한다
        AggregationFrequency::Year => "1mo",
    }
}

/// 국내 6자리 종목코드는 KOSPI 접미사를 붙입니다.
fn to_yahoo_symbol(symbol: &str, currency: &str) -> String {
    let is_krx_code = symbol.len() == 6 && symbol.chars().all(|c| c.is_ascii_digit());
    if is_krx_code && currency.eq_ignore_ascii_case("KRW") {
        format!("{}.KS", symbol)
    } else {
        symbol.to_string()
    }
}

fn to_offset_datetime(at: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| CollectorError::Source(format!("시각 변환 실패 ({}): {}", at, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_yahoo_symbol() {
        assert_eq!(to_yahoo_symbol("005930", "KRW"), "005930.KS");
        assert_eq!(to_yahoo_symbol("005930", "USD"), "005930");
        assert_eq!(to_yahoo_symbol("AAPL", "USD"), "AAPL");
    }

    #[test]
    fn test_yahoo_interval() {
        assert_eq!(yahoo_interval(AggregationFrequency::FiveMinutes), "5m");
        assert_eq!(yahoo_interval(AggregationFrequency::Week), "1wk");
        assert_eq!(yahoo_interval(AggregationFrequency::Month), "1mo");
        assert_eq!(yahoo_interval(AggregationFrequency::Year), "1mo");
    }

    #[test]
    fn test_to_offset_datetime() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let converted = to_offset_datetime(at).unwrap();
        assert_eq!(converted.unix_timestamp(), at.timestamp());
    }
}
