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

//! Leptos integration to the orbit viewer.

use std::f64::consts::TAU;

use glam::DVec2;
use leptos::{html, prelude::*};
use leptos_use::{use_raf_fn, UseRafFnCallbackArgs};
use tracing::error;
use web_sys::{
    wasm_bindgen::{JsCast, JsValue},
    CanvasRenderingContext2d,
};

use crate::{
    app::{render, AppState, Event},
    canvas::{Blend, Canvas, Color, OrbitRenderer},
    OrbitTable,
};

impl Canvas for CanvasRenderingContext2d {
    type Error = JsValue;

    fn size(&self) -> DVec2 {
        self.canvas()
            .map(|canvas| DVec2::new(canvas.width() as f64, canvas.height() as f64))
            .unwrap_or_default()
    }

    fn clear(&mut self, color: Color) -> Result<(), JsValue> {
        let size = Canvas::size(self);
        self.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
        self.set_fill_style_str(&color.to_css());
        self.fill_rect(0.0, 0.0, size.x, size.y);
        Ok(())
    }

    fn set_view(&mut self, origin: DVec2, scale: f64) -> Result<(), JsValue> {
        self.set_transform(scale, 0.0, 0.0, scale, origin.x, origin.y)
    }

    fn set_blend(&mut self, blend: Blend) -> Result<(), JsValue> {
        let op = match blend {
            Blend::Normal => "source-over",
            Blend::Lighter => "lighter",
        };

        self.set_global_composite_operation(op)
    }

    fn stroke_polylines(
        &mut self,
        lines: &[Vec<DVec2>],
        color: Color,
        width: f64,
    ) -> Result<(), JsValue> {
        self.set_line_width(width);
        self.set_stroke_style_str(&color.to_css());
        self.begin_path();

        for line in lines.iter() {
            let mut points = line.iter();

            let Some(first) = points.next() else {
                continue;
            };

            self.move_to(first.x, first.y);

            for point in points {
                self.line_to(point.x, point.y);
            }
        }

        self.stroke();
        Ok(())
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color) -> Result<(), JsValue> {
        self.set_fill_style_str(&color.to_css());
        self.begin_path();
        self.arc(center.x, center.y, radius, 0.0, TAU)?;
        self.fill();
        Ok(())
    }
}

/// An animated orbit with its name and a button for every built-in orbit.
#[component]
pub fn OrbitViewer(
    /// The name of the orbit to show first.
    #[prop(optional)]
    name: Option<String>,

    /// The width and height of the canvas in pixels.
    #[prop(default = 400)]
    size: u32,
) -> impl IntoView {
    let table = OrbitTable::builtin();
    let canvas_ref = NodeRef::<html::Canvas>::new();
    let renderer = OrbitRenderer::default();

    let selected = name
        .and_then(|name| table.find(&name).ok())
        .map(|(idx, _)| idx)
        .unwrap_or_default();

    let (state, set_state) = signal(AppState::with_selected(selected));

    let _raf = use_raf_fn(move |args: UseRafFnCallbackArgs| {
        let event = Event::Tick {
            delta_ms: args.delta,
        };

        set_state.update(|state| state.update(table, event));
    });

    Effect::new(move || {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };

        let mut ctx = match canvas.get_context("2d") {
            Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => ctx,
                Err(err) => {
                    error!("2D context has the wrong type: {err:?}");
                    return;
                }
            },
            Ok(None) => {
                error!("canvas has no 2D context");
                return;
            }
            Err(err) => {
                error!("failed to get 2D context: {err:?}");
                return;
            }
        };

        state.with(|state| {
            if let Err(err) = render(state, table, &renderer, &mut ctx) {
                error!("failed to draw orbit: {err:?}");
            }
        });
    });

    let buttons = table
        .orbits()
        .iter()
        .enumerate()
        .map(|(idx, orbit)| {
            view! {
                <button
                    style="margin:4px"
                    on:click=move |_| set_state.update(|state| state.update(table, Event::Select(idx)))
                >
                    {orbit.name.clone()}
                </button>
            }
        })
        .collect_view();

    let size = size.to_string();
    let title = move || state.with(|state| state.orbit(table).name.clone());

    view! {
        <div style="display:flex;align-items:center;flex-direction:column">
            <h2>{title}</h2>
            <canvas node_ref=canvas_ref width=size.clone() height=size />
            <div>{buttons}</div>
        </div>
    }
}
