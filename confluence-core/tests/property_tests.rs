//! Property tests for scorer and indicator invariants.
//!
//! Uses proptest to verify:
//! 1. Tie ⇒ HOLD: equal bullish/bearish counts never produce BUY or SELL
//! 2. Confidence gate: no BUY/SELL below the tier's threshold
//! 3. HOLD confidence is always exactly 50
//! 4. Indicator bounds: RSI and stochastic stay in [0, 100], all finite
//! 5. EMA degradation: too-short input returns the last price
//! 6. Determinism: scoring the same series twice is bit-identical

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use confluence_core::domain::{Bar, Direction, PriceSeries};
use confluence_core::indicators::{ema, rsi, stochastic};
use confluence_core::policy::Tier;
use confluence_core::scoring::{count_bias, resolve_direction, ConfluenceScorer, FactorTag, Scorer};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![
        Just(Tier::Conservative),
        Just(Tier::Balanced),
        Just(Tier::Aggressive),
    ]
}

fn arb_tags() -> impl Strategy<Value = Vec<FactorTag>> {
    prop::collection::vec(prop::sample::select(FactorTag::ALL.to_vec()), 0..8)
}

fn arb_confidence() -> impl Strategy<Value = f64> {
    0.0..=100.0_f64
}

/// Random-walk closes with per-bar returns in ±4%.
fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04..0.04_f64, 1..max_len).prop_map(|returns| {
        let mut price = 100.0;
        returns
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                price
            })
            .collect()
    })
}

fn arb_series() -> impl Strategy<Value = PriceSeries> {
    (arb_closes(120), prop::collection::vec(100.0..10_000.0_f64, 120)).prop_map(
        |(closes, volumes)| {
            let base = NaiveDate::from_ymd_opt(2023, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, &close)| {
                    let open = if i == 0 { close } else { closes[i - 1] };
                    Bar {
                        timestamp: base + Duration::days(i as i64),
                        open,
                        high: open.max(close) * 1.002,
                        low: open.min(close) * 0.998,
                        close,
                        volume: volumes[i],
                    }
                })
                .collect();
            PriceSeries::new("PROP", bars).unwrap()
        },
    )
}

// ── 1–3. Direction resolution ────────────────────────────────────────

proptest! {
    #[test]
    fn tie_always_holds(tier in arb_tier(), tags in arb_tags(), confidence in arb_confidence()) {
        let policy = tier.policy();
        let (bull, bear) = count_bias(&tags);
        let (direction, _) = resolve_direction(&tags, confidence, &policy);
        if bull == bear {
            prop_assert_eq!(direction, Direction::Hold);
        }
    }

    #[test]
    fn no_signal_below_threshold(tier in arb_tier(), tags in arb_tags(), confidence in arb_confidence()) {
        let policy = tier.policy();
        let (direction, reported) = resolve_direction(&tags, confidence, &policy);
        if direction != Direction::Hold {
            prop_assert!(reported >= policy.confidence_threshold());
            prop_assert_eq!(reported, confidence);
        }
    }

    #[test]
    fn hold_is_pinned_to_fifty(tier in arb_tier(), tags in arb_tags(), confidence in arb_confidence()) {
        let policy = tier.policy();
        let (direction, reported) = resolve_direction(&tags, confidence, &policy);
        if direction == Direction::Hold {
            prop_assert_eq!(reported, 50.0);
        }
    }

    #[test]
    fn signal_has_enough_confluence(tier in arb_tier(), tags in arb_tags(), confidence in arb_confidence()) {
        let policy = tier.policy();
        let (bull, bear) = count_bias(&tags);
        match resolve_direction(&tags, confidence, &policy).0 {
            Direction::Buy => prop_assert!(bull > bear && bull >= policy.min_confluent_factors()),
            Direction::Sell => prop_assert!(bear > bull && bear >= policy.min_confluent_factors()),
            Direction::Hold => {}
        }
    }
}

// ── Full scorer over random walks ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn scorer_respects_gates(tier in arb_tier(), series in arb_series()) {
        let scorer = ConfluenceScorer::new(tier.policy());
        let result = scorer.score(&series).unwrap();
        let policy = scorer.policy();

        prop_assert!((0.0..=100.0).contains(&result.confidence));
        if result.bullish_count == result.bearish_count {
            prop_assert_eq!(result.direction, Direction::Hold);
        }
        match result.direction {
            Direction::Hold => prop_assert_eq!(result.confidence, 50.0),
            _ => {
                prop_assert!(result.confidence >= policy.confidence_threshold());
                let (lo, hi) = policy.confidence_bounds();
                prop_assert!(result.confidence >= lo && result.confidence <= hi);
            }
        }
        prop_assert_eq!(result.contributing_factors.len(), 5);
        prop_assert_eq!(
            count_bias(&result.contributing_factors),
            (result.bullish_count, result.bearish_count)
        );
    }

    #[test]
    fn scoring_is_deterministic(tier in arb_tier(), series in arb_series()) {
        let scorer = ConfluenceScorer::new(tier.policy());
        let a = scorer.score(&series).unwrap();
        let b = scorer.score(&series).unwrap();
        prop_assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        prop_assert_eq!(a.indicator_snapshot.rsi.to_bits(), b.indicator_snapshot.rsi.to_bits());
        prop_assert_eq!(a, b);
    }
}

// ── 4–5. Indicators ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_in_bounds(closes in arb_closes(80), period in 2usize..30) {
        let value = rsi(&closes, period);
        prop_assert!(value.is_finite());
        prop_assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn stochastic_in_bounds(closes in arb_closes(80)) {
        let highs: Vec<f64> = closes.iter().map(|c| c * 1.01).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c * 0.99).collect();
        let s = stochastic(&highs, &lows, &closes, 14, 3);
        prop_assert!((0.0..=100.0).contains(&s.k));
        prop_assert!((0.0..=100.0).contains(&s.d));
    }

    #[test]
    fn ema_short_input_returns_last(closes in arb_closes(12), extra in 0usize..5) {
        let period = closes.len() + extra;
        prop_assert_eq!(ema(&closes, period), *closes.last().unwrap());
    }
}
