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

//! The viewer's frame loop, independent of any UI framework.

use tracing::{debug, warn};

use crate::{
    canvas::{Canvas, OrbitRenderer},
    Orbit, OrbitTable,
};

/// The animation clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Clock {
    /// No frame has been ticked yet.
    #[default]
    Idle,

    /// Seconds of wall-clock time elapsed since the first tick.
    Running(f64),
}

impl Clock {
    /// The elapsed time in seconds.
    pub fn time(&self) -> f64 {
        match self {
            Clock::Idle => 0.0,
            Clock::Running(time) => *time,
        }
    }

    /// Advances the clock by a frame delta in milliseconds.
    pub fn tick(&mut self, delta_ms: f64) {
        *self = Clock::Running(self.time() + delta_ms / 1000.0);
    }
}

/// An input to the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// An animation frame arrived this many milliseconds after the last.
    Tick { delta_ms: f64 },

    /// The user picked the orbit at this index.
    Select(usize),
}

/// The complete state of the viewer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// The animation clock.
    pub clock: Clock,

    /// The index of the displayed orbit.
    pub selected: usize,
}

impl AppState {
    /// Creates a state showing the orbit at the given index.
    pub fn with_selected(selected: usize) -> Self {
        Self {
            clock: Clock::Idle,
            selected,
        }
    }

    /// Applies a single event.
    ///
    /// Selection never touches the clock.
    pub fn update(&mut self, table: &OrbitTable, event: Event) {
        match event {
            Event::Tick { delta_ms } => {
                if !delta_ms.is_finite() || delta_ms < 0.0 {
                    warn!("ignoring bad frame delta {delta_ms}ms");
                    return;
                }

                self.clock.tick(delta_ms);
            }
            Event::Select(idx) if idx < table.len() => {
                debug!("selected orbit {:?}", table.get(idx).name);
                self.selected = idx;
            }
            Event::Select(idx) => {
                warn!("no orbit #{idx} to select");
            }
        }
    }

    /// The elapsed wall-clock time in seconds.
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// The displayed orbit.
    pub fn orbit<'a>(&self, table: &'a OrbitTable) -> &'a Orbit {
        table.get(self.selected)
    }
}

/// Draws the current frame of the viewer.
pub fn render<C: Canvas>(
    state: &AppState,
    table: &OrbitTable,
    renderer: &OrbitRenderer,
    canvas: &mut C,
) -> Result<(), C::Error> {
    renderer.draw(canvas, state.orbit(table), state.time())
}
