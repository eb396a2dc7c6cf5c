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

//! Bakes orbits from initial conditions into frequency components.

use glam::*;
use rayon::prelude::*;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::{Body, Error, FrequencyComponent, Orbit, Result};

/// Components at or below this amplitude are dropped from baked bodies.
pub const AMPLITUDE_CUTOFF: f64 = 0.001;

/// The largest forward/backward disagreement a closed simulation may have.
pub const CLOSED_ERROR_LIMIT: f64 = 0.001;

/// Baked amplitudes and phases are rounded to this many steps per unit.
pub const COMPONENT_PRECISION: f64 = 100_000_000.0;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub orbit: Vec<OrbitConfig>,
    pub simulation: SimulationConfig,
}

impl Config {
    pub fn from_toml(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// The number of recorded positions over one period.
    pub frames: usize,

    /// The number of integration steps between recorded positions.
    pub subframes: usize,
}

/// The initial conditions of a single orbit.
///
/// This is distinct from [Orbit], which is already baked. This structure
/// exists to make it easy to copy-paste three-body solutions from existing
/// work.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OrbitConfig {
    pub name: String,
    pub period: f64,
    pub energy: f64,
    pub masses: Vec<f64>,
    pub positions: Vec<DVec2>,
    pub velocities: Vec<DVec2>,
}

impl OrbitConfig {
    pub fn particles(&self) -> Vec<Particle> {
        self.masses
            .iter()
            .zip(self.positions.iter())
            .zip(self.velocities.iter())
            .map(|((mass, position), velocity)| Particle {
                mass: *mass,
                position: *position,
                velocity: *velocity,
            })
            .collect()
    }
}

/// Bakes every orbit in a config in parallel, sorted by name.
pub fn bake_all(config: &Config) -> Result<Vec<Orbit>> {
    let mut orbits = config
        .orbit
        .par_iter()
        .map(|orbit| bake(&config.simulation, orbit))
        .collect::<Result<Vec<_>>>()?;

    orbits.sort_by_cached_key(|orbit| orbit.name.clone());

    Ok(orbits)
}

pub fn bake(sim_config: &SimulationConfig, orbit_config: &OrbitConfig) -> Result<Orbit> {
    let span = info_span!("bake", orbit = orbit_config.name);
    let _enter = span.enter();

    let mut simulated = Simulation::simulate_closed(sim_config, orbit_config)?;

    simulated.fit();

    let mut bodies = simulated.analyze();

    bodies
        .iter_mut()
        .for_each(|body| body.optimize(AMPLITUDE_CUTOFF));

    bodies
        .iter_mut()
        .flat_map(|body| body.frequencies.iter_mut())
        .for_each(round_component);

    let by_body = transpose(&simulated.positions, Clone::clone);
    let total_frames = simulated.positions.len();

    for (body, baseline) in bodies.iter().zip(by_body.iter()) {
        let positions = inverse_analyze(total_frames, body);
        debug!("optimization error: {}", rms_error(&positions, baseline));
    }

    let orbit = Orbit {
        name: orbit_config.name.clone(),
        period: orbit_config.period,
        energy: orbit_config.energy,
        bodies,
    };

    orbit.validate()?;

    info!(
        "baked {} components",
        orbit
            .bodies
            .iter()
            .map(|body| body.frequencies.len())
            .sum::<usize>()
    );

    Ok(orbit)
}

/// Converts FFT bin `idx` of `frame_num` into a frequency component.
pub fn fft_to_freq(idx: usize, fft: Complex64, frame_num: usize) -> FrequencyComponent {
    let half = frame_num / 2;

    let freq = if idx == 0 {
        0
    } else if idx < half {
        -(idx as i32)
    } else {
        (frame_num - idx) as i32
    };

    FrequencyComponent {
        freq,
        amplitude: fft.norm() / frame_num as f64,
        phase: (-fft.im).atan2(fft.re),
    }
}

/// Rounds a component's amplitude and phase to [COMPONENT_PRECISION].
pub fn round_component(component: &mut FrequencyComponent) {
    let round = |val: f64| (val * COMPONENT_PRECISION).round() / COMPONENT_PRECISION;
    component.amplitude = round(component.amplitude);
    component.phase = round(component.phase);
}

pub fn inverse_analyze(frames: usize, body: &Body) -> Vec<DVec2> {
    (0..frames)
        .map(|idx| body.position_at(idx as f64 / frames as f64))
        .collect()
}

#[derive(Clone)]
pub struct Simulation {
    /// The positions of each body in the orbit, frame-major.
    pub positions: Vec<Vec<DVec2>>,

    /// The minimum body position.
    pub min_position: DVec2,

    /// The maximum body position.
    pub max_position: DVec2,
}

impl Simulation {
    pub fn from_positions(positions: Vec<Vec<DVec2>>) -> Self {
        let min_position = positions
            .iter()
            .flatten()
            .copied()
            .reduce(|p1, p2| p1.min(p2))
            .unwrap_or_default();

        let max_position = positions
            .iter()
            .flatten()
            .copied()
            .reduce(|p1, p2| p1.max(p2))
            .unwrap_or_default();

        Self {
            positions,
            min_position,
            max_position,
        }
    }

    /// Scales all positions so that the largest coordinate has magnitude 1.
    pub fn fit(&mut self) {
        let max_bound = self
            .min_position
            .abs()
            .max(self.max_position.abs())
            .max_element();

        if max_bound <= 0.0 {
            return;
        }

        let scale = 1.0 / max_bound;

        self.min_position *= scale;
        self.max_position *= scale;

        self.positions
            .iter_mut()
            .flat_map(|frame| frame.iter_mut())
            .for_each(|position| *position *= scale);
    }

    /// Simulates one period forwards and backwards and blends them into a closed loop.
    pub fn simulate_closed(config: &SimulationConfig, orbit: &OrbitConfig) -> Result<Self> {
        let initial = orbit.particles();
        let mut reversed = initial.clone();

        for particle in reversed.iter_mut() {
            particle.velocity = -particle.velocity;
        }

        let forward_span = info_span!("forward sim");
        let reverse_span = info_span!("reverse sim");

        let (mut forwards, mut backwards) = rayon::join(
            || {
                let _enter = forward_span.enter();
                Self::simulate(config, orbit.period, &initial)
            },
            || {
                let _enter = reverse_span.enter();
                Self::simulate(config, orbit.period, &reversed)
            },
        );

        backwards.reverse();

        // simulations should end where they started
        // remove the last element to even out the period
        forwards.pop();
        backwards.pop();

        let forwards_error = transpose(&forwards, Clone::clone);
        let backwards_error = transpose(&backwards, Clone::clone);

        for (forwards, backwards) in forwards_error.iter().zip(backwards_error.iter()) {
            let error = rms_error(forwards, backwards);
            debug!("closed simulation RMS error: {error}");

            if !(error < CLOSED_ERROR_LIMIT) {
                return Err(Error::OpenOrbit {
                    name: orbit.name.clone(),
                    error,
                });
            }
        }

        let frame_num = forwards.len();
        for (idx, (forwards, backwards)) in forwards.iter_mut().zip(backwards.iter()).enumerate() {
            let blend = (idx as f64) / (frame_num as f64);

            for (forward, backward) in forwards.iter_mut().zip(backwards.iter()) {
                *forward = forward.lerp(*backward, blend);
            }
        }

        Ok(Self::from_positions(forwards))
    }

    /// Integrates particles over one period, recording `frames + 1` positions.
    pub fn simulate(
        config: &SimulationConfig,
        period: f64,
        initial: &[Particle],
    ) -> Vec<Vec<DVec2>> {
        let subframe_num = config.frames * config.subframes;
        let timestep = period / subframe_num as f64;
        let mut particles = initial.to_vec();
        let mut history = Vec::with_capacity(config.frames + 1);

        let first: Vec<_> = particles.iter().map(|p| p.position).collect();
        history.push(first.clone());

        let progress_every = (config.frames / 10).max(1);
        let mut last = first.clone();
        for frame_idx in 0..config.frames {
            for _ in 0..config.subframes {
                step(timestep, &mut particles);
            }

            last = particles.iter().map(|p| p.position).collect();
            history.push(last.clone());

            if frame_idx % progress_every == 0 {
                debug!("simulating frame #{frame_idx}");
            }
        }

        debug!("start-end simulation drift: {}", rms_error(&first, &last));

        history
    }

    /// Transforms each body's trajectory into its frequency components.
    pub fn analyze(&self) -> Vec<Body> {
        let mut planner = FftPlanner::new();
        let frame_num = self.positions.len();
        let fft = planner.plan_fft_forward(frame_num);

        let mut freqs = transpose(&self.positions, |pos| Complex64 {
            re: pos.x,
            im: pos.y,
        });

        freqs.par_iter_mut().for_each(|body| fft.process(body));

        freqs
            .into_iter()
            .map(|frames| {
                let frequencies = frames
                    .into_iter()
                    .enumerate()
                    .map(|(idx, freq)| fft_to_freq(idx, freq, frame_num))
                    .collect();

                Body { frequencies }
            })
            .collect()
    }
}

/// The mean squared distance between two position lists.
pub fn rms_error(lhs: &[DVec2], rhs: &[DVec2]) -> f64 {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(lhs_pos, rhs_pos)| lhs_pos.distance_squared(*rhs_pos) / lhs.len() as f64)
        .sum()
}

/// Swaps a frame-major table into a body-major one, or back.
pub fn transpose<T, O: Clone>(positions: &[Vec<T>], map: impl Fn(&T) -> O) -> Vec<Vec<O>> {
    let width = positions.first().map_or(0, Vec::len);
    let mut by_body = vec![Vec::with_capacity(positions.len()); width];

    for frame in positions.iter() {
        for (by_body, position) in by_body.iter_mut().zip(frame.iter()) {
            by_body.push(map(position));
        }
    }

    by_body
}

pub fn step(dt: f64, particles: &mut [Particle]) {
    apply_forces(dt, particles);
    update(dt, particles);
}

/// Applies pairwise gravity with `G = 1`.
pub fn apply_forces(dt: f64, particles: &mut [Particle]) {
    for idx in 1..particles.len() {
        let (before, after) = particles.split_at_mut(idx);
        let particle = &mut after[0];

        for other in before.iter_mut() {
            let delta = particle.position - other.position;

            let mass = particle.mass * other.mass;
            let r2 = delta.length_squared();
            let force = mass / r2;

            let delta = delta.normalize();
            particle.velocity -= dt * force / particle.mass * delta;
            other.velocity += dt * force / other.mass * delta;
        }
    }
}

pub fn update(dt: f64, particles: &mut [Particle]) {
    for particle in particles.iter_mut() {
        particle.position += particle.velocity * dt;
    }
}

/// A point mass in an orbit simulation.
#[derive(Clone, Debug)]
pub struct Particle {
    pub mass: f64,
    pub position: DVec2,
    pub velocity: DVec2,
}
