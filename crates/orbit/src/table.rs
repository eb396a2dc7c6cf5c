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

use std::sync::LazyLock;

use tracing::debug;

use crate::{Error, Orbit, Result};

/// An immutable, validated table of orbits.
#[derive(Clone, Debug)]
pub struct OrbitTable {
    orbits: Vec<Orbit>,
    fallback: Orbit,
}

impl OrbitTable {
    /// Validates and wraps a list of orbits.
    ///
    /// Fails on the first orbit that doesn't pass [Orbit::validate].
    pub fn new(orbits: Vec<Orbit>) -> Result<Self> {
        for orbit in orbits.iter() {
            orbit.validate()?;
        }

        debug!("loaded {} orbits", orbits.len());

        Ok(Self {
            orbits,
            fallback: Orbit::invalid(),
        })
    }

    /// Parses a table from a JSON list of orbits.
    pub fn from_json(src: &str) -> Result<Self> {
        Self::new(serde_json::from_str(src)?)
    }

    /// Gets the table of built-in orbits.
    pub fn builtin() -> &'static Self {
        static TABLE: LazyLock<OrbitTable> = LazyLock::new(|| {
            OrbitTable::from_json(include_str!("../baked.json"))
                .expect("built-in orbit table is invalid")
        });

        &TABLE
    }

    /// Every orbit in this table.
    pub fn orbits(&self) -> &[Orbit] {
        &self.orbits
    }

    /// The number of orbits in this table.
    pub fn len(&self) -> usize {
        self.orbits.len()
    }

    /// Whether this table has no orbits, so [Self::get] always falls back.
    pub fn is_empty(&self) -> bool {
        self.orbits.is_empty()
    }

    /// Gets an orbit by index.
    ///
    /// Returns the [Orbit::invalid] placeholder if there is no such orbit.
    pub fn get(&self, idx: usize) -> &Orbit {
        self.orbits.get(idx).unwrap_or(&self.fallback)
    }

    /// Looks up an orbit and its index by name.
    pub fn find(&self, name: &str) -> Result<(usize, &Orbit)> {
        self.orbits
            .iter()
            .enumerate()
            .find(|(_, orbit)| orbit.name == name)
            .ok_or_else(|| Error::NoSuchOrbit(name.to_string()))
    }
}
