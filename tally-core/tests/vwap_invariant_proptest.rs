//! Property tests over generated trade tapes
//!
//! Tapes are built bucket by bucket so that every bucket's highest print is
//! the same price `H`. A buy strategy then only ever captures at `H`, and the
//! market VWAP can never rise above it.

use proptest::prelude::*;
use tally_core::pipeline::{accumulate, qualify, run, AccumulationParams, RunParams};
use tally_core::{RunError, Side, Trade};

const T0: i64 = 1_700_000_000_000_000_000;
const BUCKET_NS: i64 = 10_000_000;
const STEP_NS: i64 = 100_000;
const EXPONENT: u32 = 6;

/// Per bucket: price offsets below `H` (0 = at `H`) and sizes
fn bucket_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..5_000_000, 1i64..10_000_000_000), 1..=9)
}

fn tape_strategy() -> impl Strategy<Value = (i64, Vec<Trade>)> {
    (
        1_000_000i64..10_000_000_000,
        prop::collection::vec(bucket_strategy(), 1..30),
    )
        .prop_map(|(high, buckets)| {
            let mut trades = Vec::new();
            for (k, bucket) in buckets.iter().enumerate() {
                let base = T0 + k as i64 * BUCKET_NS;
                // The first print of every bucket sits at H
                for (j, &(offset, size)) in bucket.iter().enumerate() {
                    let offset = if j == 0 { 0 } else { offset.min(high - 1) };
                    trades.push(Trade::new(
                        base + (j as i64 + 1) * STEP_NS,
                        Side::Buy,
                        high - offset,
                        size,
                    ));
                }
            }
            (high, trades)
        })
}

fn params(rate: f64) -> AccumulationParams {
    AccumulationParams {
        side: Side::Buy,
        target_prt_rate: rate,
        fee_rate_bps: 50,
    }
}

proptest! {
    #[test]
    fn prop_market_vwap_never_exceeds_buy_vwap(
        (high, trades) in tape_strategy(),
        rate in 0.001f64..=1.0,
    ) {
        let qualified = qualify(&trades, Side::Buy, EXPONENT).unwrap();
        let rows = accumulate(&qualified, &params(rate)).unwrap();
        prop_assert_eq!(rows.len(), trades.len());

        let high_f = high as f64 / 1e6;
        for row in &rows {
            if let Some(cum_vwap) = row.cum_vwap {
                prop_assert!((cum_vwap - high_f).abs() <= high_f * 1e-12);
                prop_assert!(row.market_vwap <= cum_vwap * (1.0 + 1e-12));
            }
        }
    }

    #[test]
    fn prop_running_totals(
        (_high, trades) in tape_strategy(),
        rate in 0.001f64..=1.0,
    ) {
        let qualified = qualify(&trades, Side::Buy, EXPONENT).unwrap();
        let rows = accumulate(&qualified, &params(rate)).unwrap();

        let mut volume = 0i64;
        let mut previous_target = 0i64;
        let mut previous_notional = 0i64;
        let mut previous_fees = 0i64;
        for row in &rows {
            volume += row.trade.size_billionths;
            prop_assert_eq!(row.cum_volume_all, volume);
            prop_assert_eq!(row.cum_volume_side, volume);
            prop_assert!(row.cum_target_participation >= previous_target);
            prop_assert!(row.cum_notional >= previous_notional);
            prop_assert!(row.cum_fees >= previous_fees);
            prop_assert!(row.target_participation <= row.trade.size_billionths);
            prop_assert!(row.since_arrival >= 0);
            if !row.is_qualified {
                prop_assert_eq!(row.target_participation, 0);
            }
            previous_target = row.cum_target_participation;
            previous_notional = row.cum_notional;
            previous_fees = row.cum_fees;
        }
    }

    #[test]
    fn prop_every_bucket_has_a_winner((_high, trades) in tape_strategy()) {
        let qualified = qualify(&trades, Side::Buy, EXPONENT).unwrap();

        let mut by_bucket = std::collections::BTreeMap::<i64, bool>::new();
        for q in &qualified {
            *by_bucket.entry(q.bucket_id).or_insert(false) |= q.is_qualified;
        }
        prop_assert!(by_bucket.values().all(|&won| won));
    }

    #[test]
    fn prop_early_exit_matches_full_scan(
        (_high, trades) in tape_strategy(),
        target in 1.0f64..50_000.0,
    ) {
        let base = RunParams {
            side: Side::Buy,
            downsample_exponent: EXPONENT,
            target_participation_rate: 0.25,
            target_notional: target,
            fee_rate_bps: 50,
            early_exit: false,
        };
        let fused = RunParams { early_exit: true, ..base };

        match (run(&trades, &base), run(&trades, &fused)) {
            (Ok(full), Ok(fast)) => {
                prop_assert_eq!(&full, &fast);
                let last = full.last().unwrap();
                prop_assert!(last.cum_notional_currency() > target);
                if full.len() > 1 {
                    // Allow for rounding the target to whole billionths
                    prop_assert!(full[full.len() - 2].cum_notional_currency() <= target + 1e-9);
                }
            }
            (
                Err(RunError::InsufficientData { traded_notional: a, .. }),
                Err(RunError::InsufficientData { traded_notional: b, .. }),
            ) => prop_assert_eq!(a, b),
            (full, fast) => prop_assert!(false, "paths disagree: {:?} vs {:?}", full, fast),
        }
    }
}
