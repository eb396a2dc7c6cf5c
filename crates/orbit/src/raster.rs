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

//! Offscreen rendering to images and animated GIFs.

use std::{convert::Infallible, f32::consts::TAU, io::Write};

use glam::DVec2;
use raqote::{
    BlendMode, DrawOptions, DrawTarget, PathBuilder, SolidSource, Source, StrokeStyle, Transform,
};
use rayon::prelude::*;
use tracing::{debug, info_span, warn};

use crate::{
    app::{render, AppState, Event},
    canvas::{Blend, Canvas, Color, OrbitRenderer},
    Orbit, OrbitTable, Result,
};

/// The shortest frame delay GIF viewers play at full speed, in centiseconds.
pub const MIN_FRAME_DELAY: u16 = 2;

/// A [Canvas] backed by a software rasterizer.
pub struct Raster {
    target: DrawTarget,
    options: DrawOptions,
}

impl Raster {
    /// Creates a new, transparent raster.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            target: DrawTarget::new(width.into(), height.into()),
            options: DrawOptions::new(),
        }
    }

    /// Reads a single pixel as unpremultiplied RGBA.
    ///
    /// Returns `None` if the pixel is out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        let width = self.target.width() as usize;
        let height = self.target.height() as usize;

        if x >= width || y >= height {
            return None;
        }

        Some(unpremultiply(self.target.get_data()[y * width + x]))
    }

    /// Copies out every pixel as unpremultiplied RGBA, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.target
            .get_data()
            .iter()
            .copied()
            .flat_map(unpremultiply)
            .collect()
    }
}

fn unpremultiply(argb: u32) -> [u8; 4] {
    let [a, r, g, b] = argb.to_be_bytes();

    if a == 0 {
        return [0; 4];
    }

    let scale = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
    [scale(r), scale(g), scale(b), a]
}

fn solid(color: Color) -> SolidSource {
    let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    SolidSource::from_unpremultiplied_argb(alpha, color.r, color.g, color.b)
}

impl Canvas for Raster {
    type Error = Infallible;

    fn size(&self) -> DVec2 {
        DVec2::new(self.target.width() as f64, self.target.height() as f64)
    }

    fn clear(&mut self, color: Color) -> Result<(), Infallible> {
        self.target.clear(solid(color));
        Ok(())
    }

    fn set_view(&mut self, origin: DVec2, scale: f64) -> Result<(), Infallible> {
        let scale = scale as f32;
        let transform = Transform::scale(scale, scale)
            .then_translate((origin.x as f32, origin.y as f32).into());
        self.target.set_transform(&transform);
        Ok(())
    }

    fn set_blend(&mut self, blend: Blend) -> Result<(), Infallible> {
        self.options.blend_mode = match blend {
            Blend::Normal => BlendMode::SrcOver,
            Blend::Lighter => BlendMode::Add,
        };

        Ok(())
    }

    fn stroke_polylines(
        &mut self,
        lines: &[Vec<DVec2>],
        color: Color,
        width: f64,
    ) -> Result<(), Infallible> {
        let mut pb = PathBuilder::new();

        for line in lines.iter() {
            let mut points = line.iter();

            let Some(first) = points.next() else {
                continue;
            };

            pb.move_to(first.x as f32, first.y as f32);

            for point in points {
                pb.line_to(point.x as f32, point.y as f32);
            }
        }

        let style = StrokeStyle {
            width: width as f32,
            ..Default::default()
        };

        let path = pb.finish();
        let src = Source::Solid(solid(color));
        self.target.stroke(&path, &src, &style, &self.options);
        Ok(())
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color) -> Result<(), Infallible> {
        let mut pb = PathBuilder::new();
        pb.arc(center.x as f32, center.y as f32, radius as f32, 0.0, TAU);

        let path = pb.finish();
        let src = Source::Solid(solid(color));
        self.target.fill(&path, &src, &self.options);
        Ok(())
    }
}

/// Settings for an animated GIF export.
#[derive(Clone, Debug)]
pub struct GifOptions {
    /// The width and height of the image in pixels.
    pub size: u16,

    /// The number of frames in one loop of the animation.
    pub frames: usize,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            size: 400,
            frames: 120,
        }
    }
}

impl GifOptions {
    /// Picks the most frames, up to the default, that play one period of
    /// `orbit` in real time.
    pub fn fitted(orbit: &Orbit, size: u16) -> Self {
        let period_ms = 1000.0 / orbit.speed();
        let fits = (period_ms / (MIN_FRAME_DELAY as f64 * 10.0)).floor() as usize;

        Self {
            size,
            frames: fits.clamp(1, Self::default().frames),
        }
    }
}

/// Converts a frame delta to a GIF frame delay.
fn frame_delay(delta_ms: f64) -> u16 {
    // GIF delays are in hundredths of a second
    let delay = (delta_ms / 10.0).round();

    if delay < MIN_FRAME_DELAY as f64 {
        warn!(
            "{delta_ms:.2}ms frames are too short for GIF; \
             the animation will play slower than real time"
        );
    }

    delay.clamp(MIN_FRAME_DELAY as f64, u16::MAX as f64) as u16
}

/// Steps the viewer's frame loop through exactly one period of the selected orbit.
///
/// Returns each frame's state and the frame delta in milliseconds.
pub fn frame_states(table: &OrbitTable, selected: usize, frames: usize) -> (Vec<AppState>, f64) {
    let orbit = table.get(selected);
    let frames = frames.max(1);
    let delta_ms = 1000.0 / orbit.speed() / frames as f64;

    let mut state = AppState::default();
    state.update(table, Event::Select(selected));

    let states = (0..frames)
        .map(|_| {
            let frame = state.clone();
            state.update(table, Event::Tick { delta_ms });
            frame
        })
        .collect();

    (states, delta_ms)
}

/// Renders a looping animation of one orbit as a GIF.
pub fn write_gif(
    writer: impl Write,
    table: &OrbitTable,
    selected: usize,
    renderer: &OrbitRenderer,
    options: &GifOptions,
) -> Result<()> {
    let span = info_span!("gif", orbit = table.get(selected).name);
    let _enter = span.enter();

    let (states, delta_ms) = frame_states(table, selected, options.frames);
    let size = options.size;

    let delay = frame_delay(delta_ms);
    debug!("rendering {} frames, {delay}cs apart", states.len());

    let frames: Vec<_> = states
        .par_iter()
        .map(|state| {
            let mut raster = Raster::new(size, size);

            render(state, table, renderer, &mut raster).unwrap_or_else(|never| match never {});

            let mut pixels = raster.to_rgba();
            let mut frame = gif::Frame::from_rgba(size, size, &mut pixels);
            frame.delay = delay;
            frame.dispose = gif::DisposalMethod::Keep;
            frame.make_lzw_pre_encoded();
            frame
        })
        .collect();

    let mut encoder = gif::Encoder::new(writer, size, size, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    for frame in frames.iter() {
        encoder.write_lzw_pre_encoded_frame(frame)?;
    }

    Ok(())
}
