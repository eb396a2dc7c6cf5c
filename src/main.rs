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

use std::{fs::File, io::BufWriter, path::PathBuf};

use choreo_orbit::{
    canvas::OrbitRenderer,
    raster::{write_gif, GifOptions},
    simulate::{bake_all, Config},
    OrbitTable, Result,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Lists every orbit in a baked table.
    List {
        /// A baked orbit table to use instead of the built-in one.
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Bakes orbit initial conditions into a table of frequency components.
    Bake {
        /// The path to the orbit configuration.
        #[arg(default_value = "orbits.toml")]
        config: PathBuf,

        /// The path to write the baked JSON table to.
        #[arg(default_value = "baked.json")]
        output: PathBuf,
    },

    /// Renders one period of an orbit to an animated GIF.
    Render {
        /// The name of the orbit to render.
        name: String,

        /// The output path. Defaults to `<name>.gif`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The number of frames in the animation.
        ///
        /// Defaults to as many as play one period in real time, up to 120.
        #[arg(long)]
        frames: Option<usize>,

        /// The width and height of the image in pixels.
        #[arg(long, default_value_t = 400)]
        size: u16,

        /// A TOML file of renderer settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// A baked orbit table to use instead of the built-in one.
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer();

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var("CHOREO_LOG")
        .with_default_directive("choreo=info".parse().unwrap())
        .from_env()
        .expect("failed to parse logging directives");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    match args.command {
        Command::List { table } => {
            let loaded;
            let table = match table {
                Some(path) => {
                    loaded = load_table(&path)?;
                    &loaded
                }
                None => OrbitTable::builtin(),
            };

            for orbit in table.orbits() {
                let components: Vec<_> = orbit
                    .bodies
                    .iter()
                    .map(|body| body.frequencies.len().to_string())
                    .collect();

                println!(
                    "{:<16} period {:>10.6}  energy {:>10.6}  speed {:>8.4}  components [{}]",
                    orbit.name,
                    orbit.period,
                    orbit.energy,
                    orbit.speed(),
                    components.join(", ")
                );
            }
        }
        Command::Bake { config, output } => {
            let config_src = std::fs::read_to_string(&config)?;
            let config = Config::from_toml(&config_src)?;
            let baked = bake_all(&config)?;
            let baked_json = serde_json::to_string_pretty(&baked)?;

            if std::fs::exists(&output)? {
                let old_json = std::fs::read_to_string(&output)?;

                if old_json == baked_json {
                    info!("baked orbits unchanged");
                    return Ok(());
                }
            }

            std::fs::write(&output, baked_json)?;
            info!("wrote {} orbits to {}", baked.len(), output.display());
        }
        Command::Render {
            name,
            output,
            frames,
            size,
            config,
            table,
        } => {
            let loaded;
            let table = match table {
                Some(path) => {
                    loaded = load_table(&path)?;
                    &loaded
                }
                None => OrbitTable::builtin(),
            };

            let renderer = match config {
                Some(path) => OrbitRenderer::from_toml(&std::fs::read_to_string(path)?)?,
                None => OrbitRenderer::default(),
            };

            let (selected, orbit) = table.find(&name)?;
            let output = output.unwrap_or_else(|| format!("{name}.gif").into());
            let writer = BufWriter::new(File::create(&output)?);

            let options = match frames {
                Some(frames) => GifOptions { size, frames },
                None => GifOptions::fitted(orbit, size),
            };

            write_gif(writer, table, selected, &renderer, &options)?;
            info!("rendered {name:?} to {}", output.display());
        }
    }

    Ok(())
}

pub fn load_table(path: &PathBuf) -> Result<OrbitTable> {
    let src = std::fs::read_to_string(path)?;
    OrbitTable::from_json(&src)
}
