//! End-to-end pricing tests: compiled scripts, simulated dynamics and the
//! batched engine against closed-form references.

use approx::assert_relative_eq;
use tenor_core::math::interp::BilinearSurface;
use tenor_core::{Date, Tenor};
use tenor_mc::{monte_carlo_value, simulate, OverflowPolicy, SequenceKind, SimConfig, SimError};
use tenor_models::{analytic, BsParams, DupireParams, ModelParams};
use tenor_script::{EventSource, Product, ScriptError, ValuationContext};

fn date(s: &str) -> Date {
    s.parse().unwrap()
}

fn ctx() -> ValuationContext {
    ValuationContext {
        valuation_date: date("2025-01-01"),
    }
}

/// 3y European call, strike 120, on spot 100 with 15% vol and zero rates.
fn european_call() -> Product {
    Product::compile(
        &[
            EventSource::marker("strike", "120"),
            EventSource::dated(date("2028-01-01"), "pays MAX(spot() - strike, 0)"),
        ],
        &ctx(),
    )
    .unwrap()
}

fn bs_params() -> ModelParams {
    ModelParams::BlackScholes(BsParams::new(100.0, 0.15, 0.0, 0.0).unwrap())
}

fn analytic_call() -> f64 {
    analytic::call_price(100.0, 120.0, 0.15, 0.0, 0.0, 3.0)
}

#[test]
fn test_european_call_converges_under_sobol() {
    let config = SimConfig::builder()
        .n_paths(16_384)
        .sequence(SequenceKind::Sobol)
        .build()
        .unwrap();
    let results = simulate(&european_call(), &bs_params(), &config).unwrap();
    assert_relative_eq!(results.value(), analytic_call(), epsilon = 0.15);
    assert_eq!(results.discarded, 0);
}

#[test]
fn test_european_call_converges_under_pseudo() {
    let config = SimConfig::builder()
        .n_paths(65_536)
        .sequence(SequenceKind::Pseudo)
        .seed(42)
        .build()
        .unwrap();
    let results = simulate(&european_call(), &bs_params(), &config).unwrap();
    assert_relative_eq!(results.value(), analytic_call(), epsilon = 0.3);
}

#[test]
fn test_valuation_entry_points() {
    // The named constructors and the valuation wrapper agree with the
    // spelled-out pipeline
    let product = Product::new(
        &[
            EventSource::marker("strike", "120"),
            EventSource::dated(date("2028-01-01"), "pays MAX(spot() - strike, 0)"),
        ],
        &ctx(),
    )
    .unwrap();
    let params = ModelParams::black_scholes(100.0, 0.15, 0.0, 0.0).unwrap();
    let config = SimConfig::builder().n_paths(2_048).build().unwrap();

    let wrapped = monte_carlo_value(&product, &params, &config).unwrap();
    let direct = simulate(&european_call(), &bs_params(), &config).unwrap();
    assert_eq!(wrapped, direct);
}

#[test]
fn test_adjoint_greeks_match_closed_form() {
    let config = SimConfig::builder()
        .n_paths(16_384)
        .sequence(SequenceKind::Sobol)
        .compute_risk(true)
        .build()
        .unwrap();
    let results = simulate(&european_call(), &bs_params(), &config).unwrap();

    let delta = analytic::call_delta(100.0, 120.0, 0.15, 0.0, 0.0, 3.0);
    let vega = analytic::call_vega(100.0, 120.0, 0.15, 0.0, 0.0, 3.0);
    assert_relative_eq!(results.risk("d_spot").unwrap(), delta, epsilon = 0.02);
    assert_relative_eq!(results.risk("d_vol").unwrap(), vega, epsilon = 1.5);
    // Zero-rate call on a zero-dividend asset still has rate and dividend
    // sensitivity entries
    assert!(results.risk("d_rate").is_some());
    assert!(results.risk("d_div").is_some());
}

#[test]
fn test_adjoint_greeks_match_bump_and_reprice() {
    let config = SimConfig::builder()
        .n_paths(4_096)
        .sequence(SequenceKind::Sobol)
        .compute_risk(true)
        .build()
        .unwrap();
    let product = european_call();
    let results = simulate(&product, &bs_params(), &config).unwrap();

    // Same draws, bumped parameters
    let value_config = SimConfig::builder()
        .n_paths(4_096)
        .sequence(SequenceKind::Sobol)
        .build()
        .unwrap();
    let value = |spot: f64, vol: f64| {
        let params = ModelParams::black_scholes(spot, vol, 0.0, 0.0).unwrap();
        simulate(&product, &params, &value_config).unwrap().value()
    };

    let h = 0.5;
    let bump_delta = (value(100.0 + h, 0.15) - value(100.0 - h, 0.15)) / (2.0 * h);
    assert_relative_eq!(
        results.risk("d_spot").unwrap(),
        bump_delta,
        max_relative = 0.05
    );

    let h = 0.005;
    let bump_vega = (value(100.0, 0.15 + h) - value(100.0, 0.15 - h)) / (2.0 * h);
    assert_relative_eq!(
        results.risk("d_vol").unwrap(),
        bump_vega,
        max_relative = 0.05
    );
}

fn barrier_call(barrier: &str) -> Product {
    Product::compile(
        &[
            EventSource::marker("strike", "100"),
            EventSource::marker("barrier", barrier),
            EventSource::schedule(
                date("2025-01-01"),
                date("2026-01-01"),
                "3M".parse::<Tenor>().unwrap(),
                "if spot() > barrier then dead = 1 end",
            ),
            EventSource::dated(
                date("2026-01-01"),
                "opt pays MAX(spot() - strike, 0) * (1 - dead)",
            ),
        ],
        &ctx(),
    )
    .unwrap()
}

#[test]
fn test_barrier_price_is_monotone_in_barrier_level() {
    let config = SimConfig::builder()
        .n_paths(8_192)
        .sequence(SequenceKind::Sobol)
        .build()
        .unwrap();
    let params = bs_params();

    let tight = simulate(&barrier_call("130"), &params, &config)
        .unwrap()
        .value();
    let wide = simulate(&barrier_call("150"), &params, &config)
        .unwrap()
        .value();

    let vanilla_product = Product::compile(
        &[
            EventSource::marker("strike", "100"),
            EventSource::dated(date("2026-01-01"), "opt pays MAX(spot() - strike, 0)"),
        ],
        &ctx(),
    )
    .unwrap();
    let vanilla = simulate(&vanilla_product, &params, &config).unwrap().value();

    // Knocking out more paths can only lose value
    assert!(tight < wide, "tight {} vs wide {}", tight, wide);
    assert!(wide < vanilla, "wide {} vs vanilla {}", wide, vanilla);
    assert!(tight > 0.0);
}

#[test]
fn test_results_are_bitwise_reproducible() {
    for sequence in [SequenceKind::Sobol, SequenceKind::Pseudo] {
        let config = SimConfig::builder()
            .n_paths(3_000)
            .sequence(sequence)
            .seed(7)
            .compute_risk(true)
            .build()
            .unwrap();
        let a = simulate(&barrier_call("140"), &bs_params(), &config).unwrap();
        let b = simulate(&barrier_call("140"), &bs_params(), &config).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_dupire_flat_surface_reproduces_black_scholes() {
    // A flat local volatility surface makes the single log-Euler step
    // exact, so prices match Black-Scholes on identical draws.
    let surface = BilinearSurface::new(
        vec![50.0, 100.0, 200.0],
        vec![0.0, 3.0],
        vec![vec![0.15; 2]; 3],
    )
    .unwrap();
    let dupire = ModelParams::Dupire(DupireParams::new(100.0, 0.0, 0.0, surface).unwrap());

    let config = SimConfig::builder()
        .n_paths(4_096)
        .sequence(SequenceKind::Sobol)
        .build()
        .unwrap();
    let product = european_call();
    let bs_value = simulate(&product, &bs_params(), &config).unwrap().value();
    let dupire_value = simulate(&product, &dupire, &config).unwrap().value();
    assert_relative_eq!(bs_value, dupire_value, epsilon = 1e-10);
}

#[test]
fn test_dupire_risk_has_surface_buckets() {
    let surface = BilinearSurface::new(
        vec![50.0, 100.0, 200.0],
        vec![0.0, 3.0],
        vec![vec![0.15; 2]; 3],
    )
    .unwrap();
    let params = ModelParams::Dupire(DupireParams::new(100.0, 0.0, 0.0, surface).unwrap());
    let config = SimConfig::builder()
        .n_paths(2_048)
        .sequence(SequenceKind::Sobol)
        .compute_risk(true)
        .build()
        .unwrap();
    let results = simulate(&european_call(), &params, &config).unwrap();
    assert!(results.risk("d_spot").unwrap() > 0.0);
    // Total surface vega is positive for a call
    let total_vega: f64 = (0..3)
        .flat_map(|i| (0..2).map(move |j| format!("d_lvol_{}_{}", i, j)))
        .map(|label| results.risk(&label).unwrap())
        .sum();
    assert!(total_vega > 0.0);
}

#[test]
fn test_missing_marker_is_an_unbound_identifier() {
    let err = Product::compile(
        &[EventSource::dated(
            date("2026-01-01"),
            "opt pays MAX(spot() - strike, 0)",
        )],
        &ctx(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Event { source, .. }
            if matches!(&*source, ScriptError::UnboundIdentifier { name } if name == "strike")
    ));
}

fn overflowing_product() -> Product {
    // Paths finishing above 100 evaluate log(-1) and go non-finite
    Product::compile(
        &[EventSource::dated(
            date("2026-01-01"),
            "if spot() > 100 then bad = log(0 - 1) end opt pays 1",
        )],
        &ctx(),
    )
    .unwrap()
}

#[test]
fn test_fail_fast_reports_the_offending_path() {
    let config = SimConfig::builder()
        .n_paths(512)
        .sequence(SequenceKind::Pseudo)
        .seed(3)
        .build()
        .unwrap();
    let err = simulate(&overflowing_product(), &bs_params(), &config).unwrap_err();
    // Which failing path gets reported depends on batch scheduling; the
    // index must still be a real path of this run
    assert!(matches!(err, SimError::NumericOverflow { path, .. } if path < 512));
}

#[test]
fn test_discard_policy_excludes_bad_paths_from_the_average() {
    let config = SimConfig::builder()
        .n_paths(2_048)
        .sequence(SequenceKind::Pseudo)
        .seed(3)
        .overflow(OverflowPolicy::DiscardPath)
        .build()
        .unwrap();
    let results = simulate(&overflowing_product(), &bs_params(), &config).unwrap();
    // Roughly half the paths finish above 100 and get dropped; the rest
    // pay exactly 1
    assert!(results.discarded > 200 && results.discarded < 1_848);
    assert_relative_eq!(results.value(), 1.0, epsilon = 1e-12);
    assert_eq!(
        results.effective_paths(),
        results.n_paths - results.discarded
    );
}

#[test]
fn test_all_paths_discarded_is_an_error() {
    let product = Product::compile(
        &[EventSource::dated(date("2026-01-01"), "x = log(0 - 1) x pays 1")],
        &ctx(),
    )
    .unwrap();
    let config = SimConfig::builder()
        .n_paths(256)
        .sequence(SequenceKind::Pseudo)
        .overflow(OverflowPolicy::DiscardPath)
        .build()
        .unwrap();
    let err = simulate(&product, &bs_params(), &config).unwrap_err();
    assert_eq!(err, SimError::AllPathsDiscarded);
}

#[test]
fn test_small_smoothing_width_approaches_sharp_digital() {
    // Cash-or-nothing digital at 120: the sharp price is N(d2)
    let digital = Product::compile(
        &[EventSource::dated(
            date("2028-01-01"),
            "if spot() > 120 : 0.01 then pays 1 end",
        )],
        &ctx(),
    )
    .unwrap();
    let wide = Product::compile(
        &[EventSource::dated(
            date("2028-01-01"),
            "if spot() > 120 : 40 then pays 1 end",
        )],
        &ctx(),
    )
    .unwrap();

    let config = SimConfig::builder()
        .n_paths(16_384)
        .sequence(SequenceKind::Sobol)
        .build()
        .unwrap();
    let sharp = simulate(&digital, &bs_params(), &config).unwrap().value();
    let smeared = simulate(&wide, &bs_params(), &config).unwrap().value();

    // d2 for spot 100, strike 120, vol 15%, 3y, zero rates
    let std = 0.15 * 3.0f64.sqrt();
    let d2 = ((100.0f64 / 120.0).ln() - 0.5 * 0.15 * 0.15 * 3.0) / std;
    let reference = tenor_core::math::gaussian::norm_cdf(d2);
    assert_relative_eq!(sharp, reference, epsilon = 0.02);
    // A very wide band is visibly biased away from the sharp price
    assert!((smeared - reference).abs() > 0.005);
}

#[test]
fn test_bridge_changes_draw_order_not_the_law() {
    // Same product and sequence, bridged and unbridged: both must converge
    // to the same price.
    let product = barrier_call("140");
    let params = bs_params();
    let base = SimConfig::builder().n_paths(16_384);
    let bridged = simulate(
        &product,
        &params,
        &base.clone().use_bridge(true).build().unwrap(),
    )
    .unwrap()
    .value();
    let unbridged = simulate(
        &product,
        &params,
        &base.use_bridge(false).build().unwrap(),
    )
    .unwrap()
    .value();
    assert_relative_eq!(bridged, unbridged, epsilon = 0.25);
}
