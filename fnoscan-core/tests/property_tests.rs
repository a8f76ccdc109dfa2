//! Property-based tests for the indicator engine and the simulator.

use chrono::{Duration, NaiveDate};
use fnoscan_core::{
    compute_averages, confirms, simulate, Candle, Interval, MaKind, MaParams, Series,
    SimulationMode, SimulatorConfig,
};
use proptest::prelude::*;

/// Five-minute candles, `per_day` to a session, weekdays and weekends alike.
fn intraday_series(closes: &[f64], opens: &[f64], per_day: usize) -> Series {
    let first_day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let candles = closes
        .iter()
        .zip(opens)
        .enumerate()
        .map(|(i, (&close, &open))| {
            let day = first_day + Duration::days((i / per_day) as i64);
            let timestamp =
                day.and_hms_opt(9, 15, 0).unwrap() + Duration::minutes(5 * (i % per_day) as i64);
            Candle {
                timestamp,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 100,
            }
        })
        .collect();
    Series::new("PROP", Interval::Minute5, candles).unwrap()
}

fn flat_series(price: f64, len: usize) -> Series {
    let closes = vec![price; len];
    intraday_series(&closes, &closes, len.max(1))
}

fn arb_kind() -> impl Strategy<Value = MaKind> {
    prop_oneof![Just(MaKind::Simple), Just(MaKind::Exponential)]
}

fn arb_params() -> impl Strategy<Value = MaParams> {
    (1usize..8, 1usize..12, arb_kind()).prop_map(|(fast, extra, kind)| MaParams {
        fast,
        slow: fast + extra,
        kind,
    })
}

/// (closes, opens) of equal length.
fn arb_prices(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((1.0..500.0_f64, 1.0..500.0_f64), 0..max_len)
        .prop_map(|pairs| pairs.into_iter().unzip())
}

fn arb_mode() -> impl Strategy<Value = SimulationMode> {
    prop_oneof![
        Just(SimulationMode::Intraday),
        Just(SimulationMode::Daily),
        Just(SimulationMode::Both),
    ]
}

proptest! {
    /// A constant price is its own average once the window is filled.
    #[test]
    fn steady_state_average_equals_price(
        price in 1.0..10_000.0_f64,
        params in arb_params(),
        len in 1usize..80,
    ) {
        let series = flat_series(price, len);
        let annotated = compute_averages(&series, params.fast, params.slow, params.kind);
        for i in 0..len {
            if let Some(fast) = annotated.fast(i) {
                prop_assert!((fast - price).abs() <= price * 1e-12, "fast {fast} vs {price}");
            }
            if let Some(slow) = annotated.slow(i) {
                prop_assert!((slow - price).abs() <= price * 1e-12, "slow {slow} vs {price}");
            }
        }
        if len >= params.slow {
            prop_assert!(annotated.slow(len - 1).is_some());
        }
    }

    /// Values up to t never change when later candles are appended.
    #[test]
    fn averages_are_causal(
        (closes, opens) in arb_prices(120),
        params in arb_params(),
        cut in 0usize..120,
    ) {
        let full = intraday_series(&closes, &opens, 25);
        let cut = cut.min(full.len());
        let prefix = full.slice(0..cut);

        let a = compute_averages(&full, params.fast, params.slow, params.kind);
        let b = compute_averages(&prefix, params.fast, params.slow, params.kind);
        for i in 0..cut {
            prop_assert_eq!(a.fast(i), b.fast(i));
            prop_assert_eq!(a.slow(i), b.slow(i));
        }
    }

    #[test]
    fn pct_return_is_exact(
        (closes, opens) in arb_prices(150),
        params in arb_params(),
        mode in arb_mode(),
    ) {
        let series = intraday_series(&closes, &opens, 30);
        for trade in simulate(&series, mode, &SimulatorConfig::new(params)) {
            let expected = (trade.exit_price() - trade.entry_price()) / trade.entry_price();
            prop_assert_eq!(trade.pct_return(), expected);
        }
    }

    /// Four candles never confirm, whatever their closes.
    #[test]
    fn four_candle_window_never_confirms((closes, opens) in arb_prices(5)) {
        let series = intraday_series(&closes, &opens, 10);
        let window = &series.candles()[..series.len().min(4)];
        prop_assert!(!confirms(window));
    }

    /// Daily trades execute on the candle after the signal, at its open.
    #[test]
    fn daily_entry_comes_from_a_later_candle(
        (closes, opens) in arb_prices(150),
        params in arb_params(),
    ) {
        let series = intraday_series(&closes, &opens, 1);
        let candles = series.candles();
        let trades = simulate(&series, SimulationMode::Daily, &SimulatorConfig::new(params));
        for trade in &trades {
            let idx = candles.iter().position(|c| c.date() == trade.date()).unwrap();
            prop_assert!(idx >= params.slow, "trade at {} before first signal + 1", idx);
            prop_assert_eq!(trade.entry_price(), candles[idx].open);
            prop_assert_eq!(trade.exit_price(), candles[idx].close);
        }
    }
}
