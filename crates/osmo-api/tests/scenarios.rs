// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — End-to-End Scenarios
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Design-basis scenarios over the full optimize → simulate → cost
//! pipeline, with the deterministic chemistry stand-in.

use osmo_api::{
    get_defaults, optimize_ro_configuration, simulate_ro_system, MockPhreeqc, OptimizeOptions,
    SimulateOptions,
};
use osmo_chem::composition::WaterComposition;
use osmo_chem::phreeqc::{ConcentrateRequest, PhreeqcEngine};
use osmo_chem::scaling::ScalingEvaluator;
use osmo_chem::sustainable::max_sustainable_recovery;
use osmo_types::config::{AntiscalantTier, SiThresholds};
use osmo_types::deadline::Deadline;
use osmo_types::error::OsmoError;
use osmo_types::state::{DesignWarning, TrainConfig};

const BRACKISH: [(&str, f64); 2] = [("Na+", 1200.0), ("Cl-", 1800.0)];

fn seawater() -> Vec<(&'static str, f64)> {
    vec![
        ("Na+", 10770.0),
        ("Mg2+", 1290.0),
        ("Ca2+", 412.0),
        ("K+", 399.0),
        ("Sr2+", 7.9),
        ("Cl-", 19350.0),
        ("SO4-2", 2712.0),
        ("HCO3-", 142.0),
        ("Br-", 67.0),
        ("F-", 1.3),
    ]
}

fn tds(ions: &[(&str, f64)]) -> f64 {
    ions.iter().map(|(_, c)| c).sum()
}

/// Invariants 1–7 over a simulated train.
fn assert_invariants(
    config: &TrainConfig,
    result: &osmo_sim::PerformanceResult,
    feed: &WaterComposition,
) {
    // 1. System recovery is defined off the disposal split.
    let implied = 1.0 - result.system.disposal_flow_m3h / result.system.system_feed_flow_m3h;
    assert!(
        (result.system.system_recovery - implied).abs() < 1e-3,
        "recovery {} vs 1 - disposal/feed {}",
        result.system.system_recovery,
        implied
    );

    // 2. Per-stage hydraulic closure.
    for s in &result.stages {
        let residual =
            (s.feed_flow_m3h - s.permeate_flow_m3h - s.concentrate_flow_m3h).abs() / s.feed_flow_m3h;
        assert!(residual < 1e-3, "stage {} residual {residual}", s.stage_number);
    }

    // 3. Mixer closure under recycle.
    if let Some(loop_info) = &config.recycle {
        let residual = (config.system_feed_flow_m3h + loop_info.recycle_flow_m3h
            - result.stages[0].feed_flow_m3h)
            .abs()
            / config.system_feed_flow_m3h;
        assert!(residual < 1e-3, "mixer residual {residual}");
    }

    // 4. System-basis salt closure within 2%.
    let salt_in = result.system.system_feed_flow_m3h * feed.tds_mg_l();
    let salt_out = result.system.total_permeate_flow_m3h * result.system.permeate_tds_mg_l
        + result.system.disposal_flow_m3h * result.system.disposal_tds_mg_l;
    assert!(
        (salt_in - salt_out).abs() / salt_in < 0.02,
        "salt closure {}",
        (salt_in - salt_out).abs() / salt_in
    );

    // 5. Stage-wise concentration ordering per ion.
    for s in &result.stages {
        for (symbol, c_feed) in s.feed_composition.iter() {
            assert!(
                s.permeate_composition.get(symbol) <= c_feed + 1e-9,
                "stage {} {symbol} permeate above feed",
                s.stage_number
            );
            assert!(
                s.concentrate_composition.get(symbol) >= c_feed - 1e-9,
                "stage {} {symbol} concentrate below feed",
                s.stage_number
            );
        }
    }

    // 6. Electroneutrality of every produced composition.
    for s in &result.stages {
        assert!(s.feed_composition.charge_imbalance().abs() < 0.05);
        assert!(s.permeate_composition.charge_imbalance().abs() < 0.05);
        assert!(s.concentrate_composition.charge_imbalance().abs() < 0.05);
    }

    // 7. Rejections live on the unit interval.
    for s in &result.stages {
        for (symbol, r) in &s.ion_rejection {
            assert!((0.0..=1.0).contains(r), "stage {} {symbol} R={r}", s.stage_number);
        }
    }
}

// ── Scenario 1: two-stage brackish, 75% ──────────────────────────────

#[test]
fn scenario_two_stage_brackish_75() {
    let engine = MockPhreeqc::new();
    let configs = optimize_ro_configuration(
        100.0,
        0.75,
        "BW30_PRO_400",
        &OptimizeOptions {
            feed_salinity_ppm: Some(tds(&BRACKISH)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap();

    let config = configs
        .iter()
        .find(|c| c.n_stages() == 2)
        .expect("a 2-stage array must exist at 75%");
    assert!((config.system_recovery - 0.75).abs() <= 0.02);
    let n1 = config.stages[0].n_vessels as f64;
    let n2 = config.stages[1].n_vessels as f64;
    assert!((1.4..3.0).contains(&(n1 / n2)), "taper {n1}:{n2}");

    let (performance, economics) = simulate_ro_system(
        config,
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    assert!(
        (0.5..2.0).contains(&performance.system.specific_energy_kwh_m3),
        "SEC {}",
        performance.system.specific_energy_kwh_m3
    );
    assert!(
        (0.15..0.35).contains(&economics.lcow.total_usd_m3),
        "LCOW {}",
        economics.lcow.total_usd_m3
    );

    let feed = WaterComposition::validate(BRACKISH, None).unwrap().composition;
    assert_invariants(config, &performance, &feed);
}

// ── Scenario 2 + 6: high-recovery recycle, 85% ───────────────────────

#[test]
fn scenario_high_recovery_recycle_85() {
    let engine = MockPhreeqc::new();
    let configs = optimize_ro_configuration(
        100.0,
        0.85,
        "BW30_PRO_400",
        &OptimizeOptions {
            allow_recycle: Some(true),
            feed_salinity_ppm: Some(tds(&BRACKISH)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap();

    let config = configs
        .iter()
        .find(|c| c.n_stages() == 3 && c.recycle.is_some())
        .expect("85% needs a 3-stage recycle array");
    let loop_info = config.recycle.as_ref().unwrap();
    assert!(loop_info.recycle_split_ratio > 0.0);
    assert!((config.system_feed_flow_m3h - 100.0).abs() < 1e-9);
    assert!((loop_info.disposal_flow_m3h - 15.0).abs() < 1.5);

    let (performance, _) = simulate_ro_system(
        config,
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    // The historical regression: dividing by the blended stage-1 feed
    // would report recovery far below the target.
    let blended_basis =
        performance.system.total_permeate_flow_m3h / performance.stages[0].feed_flow_m3h;
    assert!(
        performance.system.system_recovery >= 0.82,
        "system recovery {}",
        performance.system.system_recovery
    );
    assert!(performance.system.system_recovery > blended_basis + 0.01);

    // Disposal TDS several times the feed.
    assert!(performance.system.disposal_tds_mg_l > 3.0 * tds(&BRACKISH));

    // Pressures markedly above the 75% single-pass case.
    let configs_75 = optimize_ro_configuration(
        100.0,
        0.75,
        "BW30_PRO_400",
        &OptimizeOptions {
            feed_salinity_ppm: Some(tds(&BRACKISH)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap();
    let config_75 = configs_75.iter().find(|c| c.n_stages() == 2).unwrap();
    let (performance_75, _) = simulate_ro_system(
        config_75,
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();
    let max_p = |r: &osmo_sim::PerformanceResult| {
        r.stages
            .iter()
            .map(|s| s.feed_pressure_bar)
            .fold(0.0_f64, f64::max)
    };
    assert!(max_p(&performance) > max_p(&performance_75));

    // Scenario 6: invariants 1–4 (and the rest) under recycle.
    let feed = WaterComposition::validate(BRACKISH, None).unwrap().composition;
    assert_invariants(config, &performance, &feed);
}

// ── Scenario 3: seawater, 45% ────────────────────────────────────────

#[test]
fn scenario_seawater_45() {
    let engine = MockPhreeqc::new();
    let sw = seawater();
    let configs = optimize_ro_configuration(
        50.0,
        0.45,
        "SW30HRLE_440",
        &OptimizeOptions {
            feed_salinity_ppm: Some(tds(&sw)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap();

    let config = configs
        .iter()
        .find(|c| c.n_stages() == 1)
        .expect("seawater at 45% is a single-stage duty");
    assert!((config.system_recovery - 0.45).abs() <= 0.02);

    let (performance, _) = simulate_ro_system(
        config,
        tds(&sw),
        &sw,
        "SW30HRLE_440",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    let p1 = performance.stages[0].feed_pressure_bar;
    assert!((55.0..75.0).contains(&p1), "feed pressure {p1} bar");
    assert!(
        (3.0..6.0).contains(&performance.system.specific_energy_kwh_m3),
        "SEC {}",
        performance.system.specific_energy_kwh_m3
    );
    for (symbol, r) in &performance.system.ion_rejection {
        assert!(*r >= 0.98, "{symbol} rejection {r}");
    }

    let feed = WaterComposition::validate(sw.iter().copied(), None)
        .unwrap()
        .composition;
    assert_invariants(config, &performance, &feed);
}

// ── Scenario 4: scaling-limited brackish ─────────────────────────────

#[test]
fn scenario_scaling_limited_brackish() {
    let engine = MockPhreeqc::new();
    let feed = vec![
        ("Ca2+", 400.0),
        ("SO4-2", 1000.0),
        ("HCO3-", 300.0),
        ("Na+", 230.0),
        ("Cl-", 150.0),
    ];

    let configs = optimize_ro_configuration(
        100.0,
        0.85,
        "BW30_PRO_400",
        &OptimizeOptions {
            feed_ion_composition: Some(feed.clone()),
            antiscalant: Some(AntiscalantTier::None),
            ..Default::default()
        },
        Some(&engine),
        &Deadline::none(),
    )
    .unwrap();

    let config = &configs[0];
    let r_max_none = config.sustainable_r_max.expect("gate must run");
    assert!(r_max_none < 0.85, "r_max {r_max_none}");
    assert!(config.warnings.iter().any(|w| matches!(
        w,
        DesignWarning::SustainableRecoveryExceeded { .. }
    )));

    // High-performance antiscalant lifts the ceiling.
    let configs_hp = optimize_ro_configuration(
        100.0,
        0.85,
        "BW30_PRO_400",
        &OptimizeOptions {
            feed_ion_composition: Some(feed),
            antiscalant: Some(AntiscalantTier::HighPerformance),
            ..Default::default()
        },
        Some(&engine),
        &Deadline::none(),
    )
    .unwrap();
    let r_max_hp = configs_hp[0].sustainable_r_max.unwrap();
    assert!(r_max_hp > r_max_none, "HP {r_max_hp} vs none {r_max_none}");
}

// ── Scenario 5: pH optimization ──────────────────────────────────────

#[test]
fn scenario_ph_optimization() {
    let engine = MockPhreeqc::new();
    let evaluator = ScalingEvaluator::new(&engine);
    let feed = WaterComposition::validate(
        [
            ("HCO3-", 300.0),
            ("Ca2+", 200.0),
            ("Na+", 100.0),
            ("Cl-", 320.0),
        ],
        None,
    )
    .unwrap()
    .composition;

    let optimum = osmo_chem::ph::maximize_sustainable_recovery(
        &evaluator,
        &feed,
        8.0,
        25.0,
        &SiThresholds::for_tier(AntiscalantTier::Standard),
        &Deadline::none(),
    )
    .unwrap();

    assert!(optimum.optimal_ph < 7.0, "optimal pH {}", optimum.optimal_ph);
    assert!(
        optimum.r_max > optimum.baseline.r_max,
        "optimized {} vs baseline {}",
        optimum.r_max,
        optimum.baseline.r_max
    );
}

// ── Laws ─────────────────────────────────────────────────────────────

#[test]
fn law_concentrate_round_trip() {
    let engine = MockPhreeqc::new();
    let feed = WaterComposition::validate(BRACKISH, None).unwrap().composition;
    for cf in [1.5, 2.0, 4.0, 8.0] {
        let report = engine
            .concentrate(&ConcentrateRequest {
                composition: feed.clone(),
                temperature_c: 25.0,
                ph: 7.5,
                concentration_factor: cf,
                fixed_ph: false,
            })
            .unwrap();
        let diluted_tds = report.composition.scaled(1.0 / cf).tds_mg_l();
        assert!(
            (diluted_tds - feed.tds_mg_l()).abs() / feed.tds_mg_l() < 0.01,
            "CF {cf}: round trip TDS {diluted_tds}"
        );
    }
}

#[test]
fn law_recycle_matches_equivalent_single_pass() {
    let engine = MockPhreeqc::new();
    let configs = optimize_ro_configuration(
        100.0,
        0.85,
        "BW30_PRO_400",
        &OptimizeOptions {
            feed_salinity_ppm: Some(tds(&BRACKISH)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap();
    let config = configs
        .iter()
        .find(|c| c.n_stages() == 3 && c.recycle.is_some())
        .unwrap();

    let (with_recycle, _) = simulate_ro_system(
        config,
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    // The same stages fed directly with the converged blended stream
    // must reproduce stage-1 performance.
    let loop_info = config.recycle.as_ref().unwrap();
    let fresh = WaterComposition::validate(BRACKISH, None).unwrap().composition;
    let blended = WaterComposition::blend(
        config.system_feed_flow_m3h,
        &fresh,
        loop_info.recycle_flow_m3h,
        &with_recycle
            .stages
            .last()
            .unwrap()
            .concentrate_composition,
    );

    let mut flat = config.clone();
    flat.recycle = None;
    flat.system_feed_flow_m3h = loop_info.blended_feed_flow_m3h;
    flat.feed_tds_mg_l = blended.tds_mg_l();
    flat.system_recovery = flat.total_permeate_flow_m3h / flat.system_feed_flow_m3h;

    let catalog = osmo_types::membrane::MembraneCatalog::builtin();
    let membrane = catalog.get("BW30_PRO_400").unwrap();
    let flat_result = osmo_sim::simulate(
        &osmo_sim::SimulationInput {
            config: &flat,
            feed: blended,
            feed_ph: 7.5,
            temperature_c: 25.0,
            membrane,
            pump_efficiency: 0.8,
            use_interstage_boost: false,
            erd: None,
        },
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    let a = &with_recycle.stages[0];
    let b = &flat_result.stages[0];
    assert!(
        (a.feed_pressure_bar - b.feed_pressure_bar).abs() / b.feed_pressure_bar < 0.02,
        "stage-1 pressure {} vs {}",
        a.feed_pressure_bar,
        b.feed_pressure_bar
    );
    assert!(
        (a.permeate_tds_mg_l - b.permeate_tds_mg_l).abs() / b.permeate_tds_mg_l < 0.05,
        "stage-1 permeate {} vs {}",
        a.permeate_tds_mg_l,
        b.permeate_tds_mg_l
    );
}

#[test]
fn law_sustainable_recovery_monotone() {
    let engine = MockPhreeqc::new();
    let evaluator = ScalingEvaluator::new(&engine);
    let base = WaterComposition::validate(
        [
            ("Ca2+", 200.0),
            ("Na+", 115.0),
            ("SO4-2", 500.0),
            ("HCO3-", 150.0),
            ("Cl-", 75.0),
        ],
        None,
    )
    .unwrap()
    .composition;
    let thresholds = SiThresholds::for_tier(AntiscalantTier::Standard);

    // Non-increasing in feed strength.
    let mut previous = f64::INFINITY;
    for scale in [0.5, 0.75, 1.0, 1.5, 2.0, 3.0] {
        let r = max_sustainable_recovery(
            &evaluator,
            &base.scaled(scale),
            7.5,
            25.0,
            &thresholds,
            false,
            &Deadline::none(),
        )
        .unwrap()
        .r_max;
        assert!(r <= previous + 1e-9, "r_max rose with TDS at scale {scale}");
        previous = r;
    }

    // Non-decreasing in antiscalant strength.
    let mut previous = -1.0;
    for tier in [
        AntiscalantTier::None,
        AntiscalantTier::Standard,
        AntiscalantTier::HighPerformance,
    ] {
        let r = max_sustainable_recovery(
            &evaluator,
            &base.scaled(1.5),
            7.5,
            25.0,
            &SiThresholds::for_tier(tier),
            false,
            &Deadline::none(),
        )
        .unwrap()
        .r_max;
        assert!(r >= previous - 1e-9, "r_max fell with stronger antiscalant");
        previous = r;
    }
}

// ── Boundary behaviors ───────────────────────────────────────────────

#[test]
fn boundary_trivial_recovery_single_vessel() {
    let configs = optimize_ro_configuration(
        250.0,
        0.01,
        "BW30_PRO_400",
        &OptimizeOptions::default(),
        None,
        &Deadline::none(),
    )
    .unwrap();
    let first = &configs[0];
    assert_eq!(first.n_stages(), 1);
    assert_eq!(first.stages[0].n_vessels, 1);
    assert!(first.system_recovery >= 0.01);
}

#[test]
fn boundary_99_percent_without_recycle_fails() {
    let err = optimize_ro_configuration(
        100.0,
        0.99,
        "BW30_PRO_400",
        &OptimizeOptions {
            allow_recycle: Some(false),
            feed_salinity_ppm: Some(tds(&BRACKISH)),
            ..Default::default()
        },
        None,
        &Deadline::none(),
    )
    .unwrap_err();
    assert!(matches!(err, OsmoError::NoFeasibleConfiguration(_)));
}

#[test]
fn boundary_deadline_cancels_pipeline() {
    let engine = MockPhreeqc::new();
    let configs = optimize_ro_configuration(
        100.0,
        0.75,
        "BW30_PRO_400",
        &OptimizeOptions::default(),
        None,
        &Deadline::none(),
    )
    .unwrap();
    let err = simulate_ro_system(
        &configs[0],
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::within(std::time::Duration::from_secs(0)),
    )
    .unwrap_err();
    assert!(matches!(err, OsmoError::Cancelled));
}

// ── Result serialization for the transport layer ─────────────────────

#[test]
fn results_serialize_to_json() {
    let engine = MockPhreeqc::new();
    let configs = optimize_ro_configuration(
        100.0,
        0.75,
        "BW30_PRO_400",
        &OptimizeOptions::default(),
        None,
        &Deadline::none(),
    )
    .unwrap();
    let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
    let (performance, economics) = simulate_ro_system(
        config,
        tds(&BRACKISH),
        &BRACKISH,
        "BW30_PRO_400",
        &SimulateOptions::default(),
        &engine,
        &Deadline::none(),
    )
    .unwrap();

    let json = serde_json::to_string(&performance).unwrap();
    assert!(json.contains("system_recovery"));
    let json = serde_json::to_string(&economics).unwrap();
    assert!(json.contains("total_usd_m3"));
    let json = serde_json::to_string(config).unwrap();
    assert!(json.contains("system_feed_flow_m3h"));

    let defaults = get_defaults(Some("BW30_PRO_400")).unwrap();
    let json = serde_json::to_string(&defaults).unwrap();
    assert!(json.contains("wacc"));
}
