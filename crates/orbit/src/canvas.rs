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

//! Backend-independent orbit drawing.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{Body, Orbit, Result};

/// An RGBA color with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 1.0);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 1.0);
    pub const RED: Self = Self::rgba(255, 0, 0, 1.0);
    pub const GREEN: Self = Self::rgba(0, 255, 0, 1.0);
    pub const BLUE: Self = Self::rgba(0, 0, 255, 1.0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha multiplied by `factor`.
    pub fn fade(self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }

    /// Formats this color as a CSS color string.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// How new shapes are composited onto the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blend {
    /// Regular source-over compositing.
    #[default]
    Normal,

    /// Additive compositing, so overlapping shapes accumulate brightness.
    Lighter,
}

/// A 2D drawing surface.
///
/// Shape coordinates are in orbit space and are mapped to pixels by the
/// transform given to [Canvas::set_view].
pub trait Canvas {
    /// The error type of the backend's draw calls.
    type Error;

    /// The size of the surface in pixels.
    fn size(&self) -> DVec2;

    /// Fills the whole surface with a color, ignoring the view transform.
    fn clear(&mut self, color: Color) -> Result<(), Self::Error>;

    /// Places the orbit-space origin at `origin` pixels, scaled by `scale`.
    fn set_view(&mut self, origin: DVec2, scale: f64) -> Result<(), Self::Error>;

    /// Sets the compositing mode of subsequent shapes.
    fn set_blend(&mut self, blend: Blend) -> Result<(), Self::Error>;

    /// Strokes several open polylines in a single draw call.
    fn stroke_polylines(
        &mut self,
        lines: &[Vec<DVec2>],
        color: Color,
        width: f64,
    ) -> Result<(), Self::Error>;

    /// Fills a circle.
    fn fill_circle(
        &mut self,
        center: DVec2,
        radius: f64,
        color: Color,
    ) -> Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrbitRenderer {
    /// Pixels per orbit-space unit.
    pub scale: f64,

    /// The color the canvas is cleared to every frame.
    pub background: Color,

    /// The radius of each body.
    pub body_radius: f64,

    /// Body fill colors, cycled by body index.
    pub body_colors: Vec<Color>,

    /// The number of afterimages drawn for each body.
    pub motion_blur: u16,

    /// The orbit duration covered by the afterimages.
    pub blur_duration: f64,

    /// The number of segments in the trail.
    pub trail_segments: u16,

    /// The orbit duration of the trail.
    pub trail_duration: f64,

    /// The stroke color of the trail.
    pub trail_stroke: Color,

    /// The width of the trail stroke.
    pub trail_width: f64,
}

impl Default for OrbitRenderer {
    fn default() -> Self {
        Self {
            scale: 100.0,
            background: Color::BLACK,
            body_radius: 0.2,
            body_colors: vec![Color::RED, Color::GREEN, Color::BLUE],
            motion_blur: 8,
            blur_duration: 0.02,
            trail_segments: 40,
            trail_duration: 0.2,
            trail_stroke: Color::rgba(255, 255, 255, 0.25),
            trail_width: 0.01,
        }
    }
}

impl OrbitRenderer {
    /// Parses renderer settings from TOML, defaulting any missing field.
    pub fn from_toml(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }

    /// The fill color of the body at `idx`.
    ///
    /// Falls back to white if no body colors are set.
    pub fn body_color(&self, idx: usize) -> Color {
        match self.body_colors.len() {
            0 => Color::WHITE,
            len => self.body_colors[idx % len],
        }
    }

    /// The display time between trail samples.
    pub fn trail_step(&self, speed: f64) -> f64 {
        self.trail_duration * speed / self.trail_segments.max(1) as f64
    }

    /// The display time between afterimages.
    pub fn blur_step(&self, speed: f64) -> f64 {
        self.blur_duration * speed / self.blur_layers() as f64
    }

    /// The number of stacked circles drawn per body.
    pub fn blur_layers(&self) -> u16 {
        self.motion_blur.max(1)
    }

    /// The opacity of each afterimage layer.
    ///
    /// The layers of a stationary body add up to full opacity.
    pub fn layer_alpha(&self) -> f64 {
        1.0 / self.blur_layers() as f64
    }

    /// Samples a body's trail, newest position first.
    ///
    /// Always returns `trail_segments + 1` points.
    pub fn trail(&self, body: &Body, time: f64, speed: f64) -> Vec<DVec2> {
        let step = self.trail_step(speed);

        (0..=self.trail_segments)
            .map(|idx| body.position_at(time - step * idx as f64))
            .collect()
    }

    /// Samples a body's afterimages, oldest first so the newest is drawn on top.
    pub fn afterimages(&self, body: &Body, time: f64, speed: f64) -> Vec<DVec2> {
        let step = self.blur_step(speed);

        (0..self.blur_layers())
            .rev()
            .map(|idx| body.position_at(time - step * idx as f64))
            .collect()
    }

    /// Draws a full frame of an orbit at some wall-clock time, in seconds.
    pub fn draw<C: Canvas>(
        &self,
        canvas: &mut C,
        orbit: &Orbit,
        time: f64,
    ) -> Result<(), C::Error> {
        canvas.set_blend(Blend::Normal)?;
        canvas.clear(self.background)?;

        if orbit.bodies.is_empty() {
            return Ok(());
        }

        let origin = canvas.size() / 2.0;
        canvas.set_view(origin, self.scale)?;

        let speed = orbit.speed();
        let time = time * speed;

        let trails: Vec<_> = orbit
            .bodies
            .iter()
            .map(|body| self.trail(body, time, speed))
            .collect();

        canvas.stroke_polylines(&trails, self.trail_stroke, self.trail_width)?;

        canvas.set_blend(Blend::Lighter)?;
        for (idx, body) in orbit.bodies.iter().enumerate() {
            let fill = self.body_color(idx).fade(self.layer_alpha());

            for position in self.afterimages(body, time, speed) {
                canvas.fill_circle(position, self.body_radius, fill)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::FrequencyComponent;

    /// A single recorded draw call.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Command {
        Clear(Color),
        SetView(DVec2, f64),
        SetBlend(Blend),
        Stroke(Vec<Vec<DVec2>>, Color, f64),
        Circle(DVec2, f64, Color),
    }

    /// A canvas that records its draw calls.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub commands: Vec<Command>,
    }

    impl Recorder {
        pub fn circles(&self) -> Vec<(DVec2, Color)> {
            self.commands
                .iter()
                .filter_map(|cmd| match cmd {
                    Command::Circle(center, _, color) => Some((*center, *color)),
                    _ => None,
                })
                .collect()
        }

        pub fn strokes(&self) -> Vec<&Vec<Vec<DVec2>>> {
            self.commands
                .iter()
                .filter_map(|cmd| match cmd {
                    Command::Stroke(lines, _, _) => Some(lines),
                    _ => None,
                })
                .collect()
        }
    }

    impl Canvas for Recorder {
        type Error = Infallible;

        fn size(&self) -> DVec2 {
            DVec2::splat(400.0)
        }

        fn clear(&mut self, color: Color) -> Result<(), Infallible> {
            self.commands.push(Command::Clear(color));
            Ok(())
        }

        fn set_view(&mut self, origin: DVec2, scale: f64) -> Result<(), Infallible> {
            self.commands.push(Command::SetView(origin, scale));
            Ok(())
        }

        fn set_blend(&mut self, blend: Blend) -> Result<(), Infallible> {
            self.commands.push(Command::SetBlend(blend));
            Ok(())
        }

        fn stroke_polylines(
            &mut self,
            lines: &[Vec<DVec2>],
            color: Color,
            width: f64,
        ) -> Result<(), Infallible> {
            self.commands
                .push(Command::Stroke(lines.to_vec(), color, width));
            Ok(())
        }

        fn fill_circle(
            &mut self,
            center: DVec2,
            radius: f64,
            color: Color,
        ) -> Result<(), Infallible> {
            self.commands.push(Command::Circle(center, radius, color));
            Ok(())
        }
    }

    pub fn circular_orbit() -> Orbit {
        let body = |freq, phase| Body {
            frequencies: vec![FrequencyComponent {
                freq,
                amplitude: 1.0,
                phase,
            }],
        };

        Orbit {
            name: "circle".to_string(),
            period: 10.0,
            energy: 1.0,
            bodies: vec![body(-1, 0.0), body(-1, 2.0), body(-1, 4.0)],
        }
    }

    fn record(renderer: &OrbitRenderer, orbit: &Orbit, time: f64) -> Recorder {
        let mut recorder = Recorder::default();
        renderer
            .draw(&mut recorder, orbit, time)
            .unwrap_or_else(|never| match never {});
        recorder
    }

    #[test]
    fn trail_has_segments_plus_one_samples_newest_first() {
        let renderer = OrbitRenderer::default();
        let orbit = circular_orbit();
        let body = &orbit.bodies[0];
        let speed = orbit.speed();
        let time = 3.5;

        let trail = renderer.trail(body, time, speed);
        assert_eq!(trail.len(), 41);
        assert_eq!(trail[0], body.position_at(time));

        let oldest = time - renderer.trail_duration * speed;
        assert!(trail[40].distance(body.position_at(oldest)) < 1e-12);
    }

    #[test]
    fn trails_are_one_batched_stroke() {
        let renderer = OrbitRenderer::default();
        let orbit = circular_orbit();
        let recorder = record(&renderer, &orbit, 1.0);

        let strokes = recorder.strokes();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].len(), orbit.bodies.len());

        for line in strokes[0].iter() {
            assert_eq!(line.len(), renderer.trail_segments as usize + 1);
        }
    }

    #[test]
    fn trail_is_drawn_in_display_time() {
        let renderer = OrbitRenderer::default();
        let orbit = circular_orbit();
        let time = 2.0;
        let recorder = record(&renderer, &orbit, time);

        let newest = recorder.strokes()[0][1][0];
        let expected = orbit.bodies[1].position_at(orbit.display_time(time));
        assert!(newest.distance(expected) < 1e-12);
    }

    #[test]
    fn afterimage_alphas_sum_to_one() {
        let renderer = OrbitRenderer::default();
        let orbit = circular_orbit();
        let recorder = record(&renderer, &orbit, 0.5);

        let circles = recorder.circles();
        assert_eq!(circles.len(), 8 * orbit.bodies.len());

        let body_alpha: f64 = circles.iter().take(8).map(|(_, color)| color.a).sum();
        assert!((body_alpha - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bodies_cycle_colors() {
        let renderer = OrbitRenderer::default();
        let mut orbit = circular_orbit();
        orbit.bodies.push(orbit.bodies[0].clone());

        let recorder = record(&renderer, &orbit, 0.5);
        let colors: Vec<_> = recorder
            .circles()
            .chunks(8)
            .map(|layers| {
                assert!(layers.iter().all(|(_, color)| *color == layers[0].1));
                layers[0].1
            })
            .collect();

        let alpha = renderer.layer_alpha();
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[0], Color::RED.fade(alpha));
        assert_eq!(colors[1], Color::GREEN.fade(alpha));
        assert_eq!(colors[2], Color::BLUE.fade(alpha));
        assert_eq!(colors[3], colors[0]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn missing_body_colors_fall_back_to_white() {
        let renderer = OrbitRenderer {
            body_colors: vec![],
            ..Default::default()
        };

        assert_eq!(renderer.body_color(5), Color::WHITE);
    }

    #[test]
    fn newest_afterimage_is_current_position() {
        let renderer = OrbitRenderer::default();
        let orbit = circular_orbit();
        let recorder = record(&renderer, &orbit, 0.75);

        let circles = recorder.circles();
        let current = orbit.bodies[0].position_at(orbit.display_time(0.75));
        assert!(circles[7].0.distance(current) < 1e-12);
        assert!(circles[0].0.distance(current) > 0.0);
    }

    #[test]
    fn bodies_blend_additively_after_trails() {
        let renderer = OrbitRenderer::default();
        let recorder = record(&renderer, &circular_orbit(), 0.0);

        let blend_idx = recorder
            .commands
            .iter()
            .position(|cmd| *cmd == Command::SetBlend(Blend::Lighter))
            .unwrap();

        let stroke_idx = recorder
            .commands
            .iter()
            .position(|cmd| matches!(cmd, Command::Stroke(..)))
            .unwrap();

        let first_circle = recorder
            .commands
            .iter()
            .position(|cmd| matches!(cmd, Command::Circle(..)))
            .unwrap();

        assert!(stroke_idx < blend_idx);
        assert!(blend_idx < first_circle);
    }

    #[test]
    fn frame_is_cleared_and_centered() {
        let renderer = OrbitRenderer::default();
        let recorder = record(&renderer, &circular_orbit(), 0.0);

        assert_eq!(recorder.commands[0], Command::SetBlend(Blend::Normal));
        assert_eq!(recorder.commands[1], Command::Clear(Color::BLACK));
        assert_eq!(
            recorder.commands[2],
            Command::SetView(DVec2::splat(200.0), 100.0)
        );
    }

    #[test]
    fn invalid_orbit_only_clears() {
        let renderer = OrbitRenderer::default();
        let recorder = record(&renderer, &Orbit::invalid(), 12.0);

        assert_eq!(
            recorder.commands,
            vec![
                Command::SetBlend(Blend::Normal),
                Command::Clear(Color::BLACK)
            ]
        );
    }

    #[test]
    fn zero_blur_still_draws_bodies() {
        let renderer = OrbitRenderer {
            motion_blur: 0,
            ..Default::default()
        };

        let orbit = circular_orbit();
        let recorder = record(&renderer, &orbit, 0.0);
        let circles = recorder.circles();
        assert_eq!(circles.len(), orbit.bodies.len());
        assert_eq!(circles[0].1.a, 1.0);
    }

    #[test]
    fn renderer_config_overrides_defaults() {
        let src = r#"
            motion_blur = 4
            trail_segments = 10
            body_colors = [{ r = 255, g = 255, b = 0, a = 1.0 }]
        "#;

        let renderer = OrbitRenderer::from_toml(src).unwrap();
        assert_eq!(renderer.motion_blur, 4);
        assert_eq!(renderer.trail_segments, 10);
        assert_eq!(renderer.body_colors, vec![Color::rgba(255, 255, 0, 1.0)]);
        assert_eq!(renderer.body_color(2), Color::rgba(255, 255, 0, 1.0));
        assert_eq!(renderer.scale, 100.0);
        assert_eq!(renderer.layer_alpha(), 0.25);
    }

    #[test]
    fn css_colors() {
        assert_eq!(Color::WHITE.fade(0.5).to_css(), "rgba(255, 255, 255, 0.5)");
    }
}
