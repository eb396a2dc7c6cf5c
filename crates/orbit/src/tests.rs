// Copyright (C) 2025-2026 Marceline Cramer
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Saturn V is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option) any
// later version.
//
// Saturn V is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for
// more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Saturn V. If not, see <https://www.gnu.org/licenses/>.

use std::f64::consts::PI;

use crate::*;

const TIMES: [f64; 7] = [0.0, 0.1, 0.25, 0.5, 0.77, 1.3, -2.45];

fn component(freq: i32, amplitude: f64, phase: f64) -> FrequencyComponent {
    FrequencyComponent {
        freq,
        amplitude,
        phase,
    }
}

fn orbit(period: f64, energy: f64) -> Orbit {
    Orbit {
        name: "test".to_string(),
        period,
        energy,
        bodies: vec![Body {
            frequencies: vec![component(1, 1.0, 0.0)],
        }],
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

#[test]
fn test_single_component_is_circular() {
    for (freq, amplitude, phase) in [(1, 0.5, 0.0), (-3, 1.25, 1.0), (7, 0.01, -2.5)] {
        let body = Body {
            frequencies: vec![component(freq, amplitude, phase)],
        };

        for t in TIMES {
            let radius = body.position_at(t).length();
            assert!((radius - amplitude).abs() < 1e-12, "t = {t}: {radius}");
        }
    }
}

#[test]
fn test_period_is_inverse_gcd() {
    let body = Body {
        frequencies: vec![
            component(-2, 0.5, 0.3),
            component(4, 0.2, 1.1),
            component(6, 0.05, -0.7),
        ],
    };

    let divisor = body
        .frequencies
        .iter()
        .map(|freq| freq.freq)
        .reduce(gcd)
        .unwrap();

    assert_eq!(divisor, 2);
    let period = 1.0 / divisor as f64;

    for t in TIMES {
        let start = body.position_at(t);
        let end = body.position_at(t + period);
        assert!(start.distance(end) < 1e-9, "t = {t}");

        let half = body.position_at(t + period / 2.0);
        assert!(start.distance(half) > 1e-3, "t = {t}");
    }
}

#[test]
fn test_sample_at_zero() {
    let body = Body {
        frequencies: vec![
            component(-1, 0.55295976, 0.0),
            component(-8, 0.00144649, 0.0),
            component(6, 0.21819415, PI),
        ],
    };

    let expected = body
        .frequencies
        .iter()
        .map(|c| DVec2::new(c.amplitude * (-c.phase).cos(), c.amplitude * (-c.phase).sin()))
        .sum::<DVec2>();

    let sampled = body.position_at(0.0);
    assert!(sampled.distance(expected) < 1e-12);

    // 0.55295976 + 0.00144649 - 0.21819415
    assert!((sampled.x - 0.3362121).abs() < 1e-12);
    assert!(sampled.y.abs() < 1e-12);
}

#[test]
fn test_sample_direction() {
    // positive frequencies rotate clockwise
    let sample = component(1, 1.0, 0.0).sample(0.25);
    assert!(sample.distance(DVec2::new(0.0, -1.0)) < 1e-12);

    assert_eq!(FrequencyComponent::ZERO.sample(0.3), DVec2::ZERO);
    assert_eq!(Body::default().position_at(1.0), DVec2::ZERO);
}

#[test]
fn test_positions_at() {
    let mut orbit = orbit(1.0, 1.0);
    orbit.bodies.push(Body {
        frequencies: vec![component(2, 0.5, PI)],
    });

    let positions = orbit.positions_at(0.125);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0], orbit.bodies[0].position_at(0.125));
    assert_eq!(positions[1], orbit.bodies[1].position_at(0.125));
}

#[test]
fn test_speed() {
    let orbit = orbit(5.0, -2.0);
    assert_eq!(orbit.speed(), 0.5);
    assert_eq!(orbit.display_time(3.0), 1.5);
}

#[test]
fn test_zero_energy_rejected() {
    let result = OrbitTable::new(vec![orbit(1.0, 0.0)]);
    assert!(matches!(result, Err(Error::ZeroEnergy { .. })));
}

#[test]
fn test_bad_energy_rejected() {
    for energy in [f64::NAN, f64::INFINITY] {
        let result = orbit(1.0, energy).validate();
        assert!(matches!(result, Err(Error::InvalidEnergy { .. })));
    }
}

#[test]
fn test_bad_period_rejected() {
    for period in [0.0, -1.0, f64::NAN] {
        let result = orbit(period, 1.0).validate();
        assert!(matches!(result, Err(Error::InvalidPeriod { .. })));
    }
}

#[test]
fn test_bad_component_rejected() {
    let mut orbit = orbit(1.0, 1.0);
    orbit.bodies.push(Body {
        frequencies: vec![component(1, f64::NAN, 0.0)],
    });

    let result = orbit.validate();
    assert!(matches!(result, Err(Error::InvalidComponent { body: 1, .. })));
}

#[test]
fn test_builtin_table() {
    let table = OrbitTable::builtin();
    assert!(!table.is_empty());

    for orbit in table.orbits() {
        assert!(orbit.speed().is_finite());
        assert_eq!(orbit.bodies.len(), 3);

        for component in orbit.bodies.iter().flat_map(|body| body.frequencies.iter()) {
            assert!(component.amplitude > 0.001);
            assert_eq!((component.amplitude * 1e8).round() / 1e8, component.amplitude);
            assert_eq!((component.phase * 1e8).round() / 1e8, component.phase);
        }
    }

    let names: Vec<_> = table.orbits().iter().map(|orbit| &orbit.name).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let (idx, orbit) = table.find("Figure Eight").unwrap();
    assert_eq!(table.get(idx), orbit);
}

#[test]
fn test_find_missing() {
    let table = OrbitTable::builtin();
    assert!(matches!(table.find("nope"), Err(Error::NoSuchOrbit(_))));
}

#[test]
fn test_empty_table_falls_back() {
    let table = OrbitTable::new(vec![]).unwrap();
    assert!(table.is_empty());

    let orbit = table.get(0);
    assert_eq!(orbit.name, "invalid orbit");
    assert_eq!(orbit.period, 0.0);
    assert_eq!(orbit.energy, 0.0);
    assert!(orbit.bodies.is_empty());
}

#[test]
fn test_table_from_json() {
    let src = r#"[{
        "name": "ring",
        "period": 2.0,
        "energy": -1.0,
        "bodies": [{ "frequencies": [{ "freq": -1, "amplitude": 0.5, "phase": 0.0 }] }]
    }]"#;

    let table = OrbitTable::from_json(src).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0).bodies[0].frequencies[0].freq, -1);

    let zero = src.replace("-1.0", "0.0");
    assert!(matches!(
        OrbitTable::from_json(&zero),
        Err(Error::ZeroEnergy { .. })
    ));

    assert!(matches!(OrbitTable::from_json("{"), Err(Error::Json(_))));
}
