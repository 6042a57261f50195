//! 가격 시계열과 거래 원장의 정렬 속성 테스트

use chrono::{DateTime, Duration, TimeZone, Utc};
use folio_core::{PriceSample, PriceSeries, Transaction, TransactionLedger};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn series_stays_sorted_and_unique(
        writes in prop::collection::vec((0i64..500, 1i64..10_000), 0..80),
    ) {
        let mut series = PriceSeries::new();
        for (minute, cents) in &writes {
            series.upsert(PriceSample::new(
                origin() + Duration::minutes(*minute),
                Decimal::new(*cents, 2),
            ));
        }

        for pair in series.as_slice().windows(2) {
            prop_assert!(pair[0].time < pair[1].time);
        }

        // 같은 시각은 마지막 쓰기가 남는다
        for (minute, _) in &writes {
            let at = origin() + Duration::minutes(*minute);
            let (_, expected) = writes.iter().rev().find(|(m, _)| m == minute).unwrap();
            prop_assert_eq!(
                series.price_at(at).map(|s| s.price),
                Some(Decimal::new(*expected, 2))
            );
        }
    }

    #[test]
    fn ledger_push_keeps_time_order_and_quantity(
        trades in prop::collection::vec((0i64..100, -50i64..50), 0..60),
    ) {
        let mut ledger = TransactionLedger::new();
        for (day, amount) in &trades {
            ledger.push(Transaction::new(
                origin() + Duration::days(*day),
                Decimal::from(*amount),
                Decimal::ONE,
            ));
        }

        for pair in ledger.as_slice().windows(2) {
            prop_assert!(pair[0].time <= pair[1].time);
        }

        let cutoff = origin() + Duration::days(50);
        let expected: i64 = trades
            .iter()
            .filter(|(day, _)| origin() + Duration::days(*day) <= cutoff)
            .map(|(_, amount)| amount)
            .sum();
        prop_assert_eq!(ledger.quantity_at(cutoff), Decimal::from(expected));
    }
}
