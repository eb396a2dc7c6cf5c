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

//! Periodic three-body orbits stored as truncated Fourier series.

use std::f64::consts::TAU;

use glam::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod app;
pub mod canvas;
pub mod table;

#[cfg(feature = "leptos")]
pub mod leptos;

#[cfg(feature = "raster")]
pub mod raster;

#[cfg(feature = "simulate")]
pub mod simulate;

#[cfg(test)]
mod tests;

pub use table::OrbitTable;

/// A type alias for results using this crate's [Error].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error loading, baking, or exporting orbits.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("orbit {name:?} has zero energy")]
    ZeroEnergy { name: String },

    #[error("orbit {name:?} has non-finite energy {energy}")]
    InvalidEnergy { name: String, energy: f64 },

    #[error("orbit {name:?} has invalid period {period}")]
    InvalidPeriod { name: String, period: f64 },

    #[error("orbit {name:?} has a non-finite frequency component in body #{body}")]
    InvalidComponent { name: String, body: usize },

    #[error("no orbit named {0:?}")]
    NoSuchOrbit(String),

    #[error("closed simulation of {name:?} did not close (error {error})")]
    OpenOrbit { name: String, error: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "raster")]
    #[error("failed to encode GIF: {0}")]
    Gif(#[from] gif::EncodingError),
}

/// A periodic orbit: random-access reconstruction at any timestep.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Orbit {
    /// The name of the orbit.
    pub name: String,

    /// The duration of this orbit's period.
    pub period: f64,

    /// The total energy of the orbit.
    ///
    /// Only used to scale the orbit's display speed.
    pub energy: f64,

    /// Each [Body] in this orbit.
    pub bodies: Vec<Body>,
}

impl Orbit {
    /// The placeholder orbit shown when no orbits are available.
    ///
    /// It has no bodies, so it draws nothing.
    pub fn invalid() -> Self {
        Self {
            name: "invalid orbit".to_string(),
            period: 0.0,
            energy: 0.0,
            bodies: vec![],
        }
    }

    /// Checks that this orbit has a usable period and energy.
    ///
    /// Zero or non-finite values would make [Self::speed] infinite or NaN.
    pub fn validate(&self) -> Result<()> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(Error::InvalidPeriod {
                name: self.name.clone(),
                period: self.period,
            });
        }

        if !self.energy.is_finite() {
            return Err(Error::InvalidEnergy {
                name: self.name.clone(),
                energy: self.energy,
            });
        }

        if self.energy == 0.0 {
            return Err(Error::ZeroEnergy {
                name: self.name.clone(),
            });
        }

        for (idx, body) in self.bodies.iter().enumerate() {
            if !body.is_finite() {
                return Err(Error::InvalidComponent {
                    name: self.name.clone(),
                    body: idx,
                });
            }
        }

        Ok(())
    }

    /// Speed scaling factor, in periods per second.
    ///
    /// Normalizes orbits of differing periods and energies to a visually
    /// comparable rate.
    pub fn speed(&self) -> f64 {
        10.0 / self.period / (self.energy * self.energy)
    }

    /// Converts wall-clock seconds into this orbit's display time.
    pub fn display_time(&self, wall_time: f64) -> f64 {
        self.speed() * wall_time
    }

    /// Calculates the position of every body at a given time.
    pub fn positions_at(&self, time: f64) -> Vec<DVec2> {
        self.bodies.iter().map(|body| body.position_at(time)).collect()
    }
}

/// A single body: the frequency components of its motion.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Body {
    /// Every frequency component in this body's position.
    pub frequencies: Vec<FrequencyComponent>,
}

impl Body {
    /// Discards all frequency components with amplitudes at or below the cutoff.
    #[cfg(feature = "simulate")]
    pub fn optimize(&mut self, cutoff: f64) {
        let original_length = self.frequencies.len();
        self.frequencies.retain(|freq| freq.amplitude > cutoff);
        let new_length = self.frequencies.len();
        tracing::debug!("optimized #freqs from {original_length} to {new_length}");
    }

    /// Calculates the position of this body at a given time.
    pub fn position_at(&self, time: f64) -> DVec2 {
        self.frequencies.iter().map(|freq| freq.sample(time)).sum()
    }

    fn is_finite(&self) -> bool {
        self.frequencies
            .iter()
            .all(|freq| freq.amplitude.is_finite() && freq.phase.is_finite())
    }
}

/// A single frequency component.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct FrequencyComponent {
    /// The frequency of this component, in cycles per orbit period.
    pub freq: i32,

    /// The amplitude of this frequency component.
    pub amplitude: f64,

    /// The phase of this frequency component.
    pub phase: f64,
}

impl FrequencyComponent {
    /// A zeroed frequency component.
    pub const ZERO: Self = Self {
        freq: 0,
        amplitude: 0.0,
        phase: 0.0,
    };

    /// Samples the value of this frequency component at some timestep (unit is periods).
    pub fn sample(&self, at: f64) -> DVec2 {
        let theta = TAU * at * self.freq as f64 + self.phase;
        DVec2::from_angle(-theta) * self.amplitude
    }
}
