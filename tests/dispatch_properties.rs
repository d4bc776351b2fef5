//! Dispatch invariants checked over a grid of batteries and energy gaps.

mod common;

use approx::assert_relative_eq;

use solar_twin::dispatch::{BatteryParams, ScenarioAdjustment, WhatIf, simulate};

const EPS: f64 = 1e-9;

fn grid() -> impl Iterator<Item = (f64, f64, f64, f64, f64)> {
    let capacities = [1.0, 13.5, 50.0, 200.0];
    let reserves = [0.0, 0.1, 0.5, 0.9];
    let initials = [0.0, 0.05, 0.5, 1.0];
    let flows = [(0.0, 0.0), (100.0, 80.0), (30.0, 80.0), (0.0, 500.0), (500.0, 0.0), (40.0, 40.0)];
    capacities.into_iter().flat_map(move |c| {
        reserves.into_iter().flat_map(move |r| {
            initials
                .into_iter()
                .flat_map(move |i| flows.into_iter().map(move |(s, l)| (c, r, i, s, l)))
        })
    })
}

#[test]
fn energy_is_conserved() {
    for (c, r, i, s, l) in grid() {
        let t = common::totals(s, l);
        let d = simulate(&t, &common::battery(c, r, i)).unwrap();
        let lhs = s + d.battery_discharged_kwh + d.grid_import_kwh;
        let rhs = l + d.battery_charged_kwh + d.grid_export_kwh;
        assert!((lhs - rhs).abs() < EPS, "imbalance at {c} {r} {i} {s} {l}");
    }
}

#[test]
fn flows_are_mutually_exclusive() {
    for (c, r, i, s, l) in grid() {
        let d = simulate(&common::totals(s, l), &common::battery(c, r, i)).unwrap();
        assert!(d.battery_discharged_kwh == 0.0 || d.battery_charged_kwh == 0.0);
        assert!(d.grid_import_kwh == 0.0 || d.grid_export_kwh == 0.0);
        assert!(d.battery_discharged_kwh >= 0.0 && d.battery_charged_kwh >= 0.0);
        assert!(d.grid_import_kwh >= 0.0 && d.grid_export_kwh >= 0.0);
    }
}

#[test]
fn state_of_charge_stays_between_reserve_and_capacity() {
    for (c, r, i, s, l) in grid() {
        let d = simulate(&common::totals(s, l), &common::battery(c, r, i)).unwrap();
        assert!(d.final_state_of_charge_kwh >= d.reserve_energy_kwh - EPS);
        assert!(d.final_state_of_charge_kwh <= c + EPS);
        assert_relative_eq!(d.reserve_energy_kwh + d.usable_capacity_kwh, c, epsilon = EPS);
    }
}

#[test]
fn repeated_evaluation_is_identical() {
    for (c, r, i, s, l) in grid() {
        let t = common::totals(s, l);
        let b = common::battery(c, r, i);
        assert_eq!(simulate(&t, &b).unwrap(), simulate(&t, &b).unwrap());
    }
}

#[test]
fn more_capacity_never_imports_more() {
    let t = common::totals(30.0, 80.0);
    let mut last = f64::INFINITY;
    for c in [10.0, 20.0, 40.0, 80.0, 160.0] {
        let d = simulate(&t, &common::battery(c, 0.2, 0.5)).unwrap();
        assert!(d.grid_import_kwh <= last + EPS);
        last = d.grid_import_kwh;
    }
}

#[test]
fn surplus_charges_and_exports() {
    let d = simulate(&common::totals(100.0, 80.0), &common::battery(50.0, 0.2, 0.5)).unwrap();
    assert_relative_eq!(d.battery_charged_kwh, 20.0, epsilon = EPS);
    assert_relative_eq!(d.grid_export_kwh, 0.0, epsilon = EPS);
    assert_relative_eq!(d.final_state_of_charge_kwh, 45.0, epsilon = EPS);
    assert!(!d.discharge_was_capped);
}

#[test]
fn deficit_is_capped_by_usable_energy() {
    let d = simulate(&common::totals(30.0, 80.0), &common::battery(50.0, 0.2, 0.5)).unwrap();
    assert_relative_eq!(d.battery_discharged_kwh, 15.0, epsilon = EPS);
    assert_relative_eq!(d.grid_import_kwh, 35.0, epsilon = EPS);
    assert_relative_eq!(d.final_state_of_charge_kwh, 10.0, epsilon = EPS);
    assert!(d.discharge_was_capped);
}

#[test]
fn charge_below_reserve_is_not_usable() {
    let d = simulate(&common::totals(0.0, 5.0), &common::battery(50.0, 0.2, 0.1)).unwrap();
    assert_eq!(d.battery_discharged_kwh, 0.0);
    assert_relative_eq!(d.grid_import_kwh, 5.0, epsilon = EPS);
    assert_relative_eq!(d.final_state_of_charge_kwh, 10.0, epsilon = EPS);
}

#[test]
fn what_if_sliders_feed_the_simulator() {
    let what_if = WhatIf {
        battery: BatteryParams {
            capacity_kwh: 100.0,
            min_soc_pct: 10.0,
            initial_charge_pct: 40.0,
        },
        scenario: ScenarioAdjustment {
            panel_increase_pct: 50.0,
            load_reduction_pct: 25.0,
        },
    };
    let outcome = what_if.evaluate(&common::totals(40.0, 80.0)).unwrap();
    // 60 kWh solar against 60 kWh load: nothing moves
    assert_relative_eq!(outcome.totals.solar_generated_kwh, 60.0, epsilon = EPS);
    assert_relative_eq!(outcome.totals.consumed_kwh, 60.0, epsilon = EPS);
    assert_eq!(outcome.dispatch.grid_import_kwh, 0.0);
    assert_eq!(outcome.dispatch.grid_export_kwh, 0.0);
    assert_relative_eq!(outcome.dispatch.final_state_of_charge_kwh, 40.0, epsilon = EPS);
}

#[test]
fn near_empty_battery_leaves_deficit_to_grid() {
    let d = simulate(&common::totals(30.0, 80.0), &common::battery(50.0, 0.2, 0.1)).unwrap();
    assert_eq!(d.battery_discharged_kwh, 0.0);
    assert_relative_eq!(d.net_energy_kwh, -50.0, epsilon = EPS);
    assert_relative_eq!(d.grid_import_kwh, 50.0, epsilon = EPS);
    assert_relative_eq!(d.final_state_of_charge_kwh, 10.0, epsilon = EPS);
}

#[test]
fn zero_capacity_is_rejected_by_name() {
    let err = WhatIf {
        battery: BatteryParams {
            capacity_kwh: 0.0,
            ..BatteryParams::default()
        },
        ..WhatIf::default()
    }
    .evaluate(&common::totals(100.0, 80.0))
    .unwrap_err();
    assert!(err.to_string().contains("capacityKWh"));
}

#[test]
fn panel_increase_is_monotone() {
    for (solar, load) in [(30.0, 80.0), (60.0, 80.0), (100.0, 80.0)] {
        let points = WhatIf::default()
            .sweep_panel_increase(&common::totals(solar, load), 200.0, 10.0)
            .unwrap();
        for pair in points.windows(2) {
            let (a, b) = (&pair[0].outcome.dispatch, &pair[1].outcome.dispatch);
            assert!(b.grid_export_kwh >= a.grid_export_kwh - EPS);
            assert!(b.grid_import_kwh <= a.grid_import_kwh + EPS);
        }
    }
}
