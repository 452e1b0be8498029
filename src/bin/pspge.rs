// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Developer CLI for the GE pipeline
//!
//! - `describe` prints how a vertex type is laid out and decoded
//! - `replay` decodes a recorded draw capture
//! - `simulate` drives the framebuffer cache with a headless backend

use clap::{Parser, Subcommand};
use log::{error, info};
use pspge::core::capture::DrawCapture;
use pspge::core::config::BackendConfig;
use pspge::core::draw::{CollectingSink, DrawEngine, OwnedBatch};
use pspge::core::error::Result;
use pspge::core::framebuffer::headless::{BackendStats, HeadlessBackend};
use pspge::core::framebuffer::{
    BufferFormat, FramebufferInfo, FramebufferManager, RenderRequest, VRAM_BASE,
};
use pspge::core::memory::PspMemory;
use pspge::core::vertex::{plan, DecoderOptions, VertexPlan};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// PSP GE vertex decoder and framebuffer cache tools
#[derive(Parser)]
#[command(name = "pspge")]
#[command(about = "PSP GE vertex decoder and framebuffer cache tools", long_about = None)]
struct Args {
    /// Backend configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the source and canonical layouts of a vertex type
    Describe {
        /// Vertex type code (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_code)]
        code: u32,
    },

    /// Decode a draw capture and print the canonical vertices
    Replay {
        /// Capture file written by `DrawCapture::save_to_file`
        capture: PathBuf,

        /// Print batches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the framebuffer cache for a number of frames
    Simulate {
        /// Number of frames to present
        #[arg(short = 'f', long, default_value = "60")]
        frames: u32,
    },
}

fn parse_code(text: &str) -> std::result::Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid vertex type '{}': {}", text, e))
}

fn main() -> Result<()> {
    // Load .env file if present (log levels for development)
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("pspge v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            BackendConfig::from_file(path).inspect_err(|e| error!("Failed to load config: {}", e))?
        }
        None => BackendConfig::default(),
    };

    match args.command {
        Command::Describe { code } => describe(code, &config),
        Command::Replay { capture, json } => replay(&capture, json, &config),
        Command::Simulate { frames } => simulate(frames, &config),
    }
}

fn describe(code: u32, config: &BackendConfig) -> Result<()> {
    let plan = plan(code, &DecoderOptions::from(config));
    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &VertexPlan) {
    let source = &plan.source;
    let canonical = &plan.canonical;

    println!("Vertex type {:#010x}: {}", plan.descriptor.code, plan.descriptor);
    if plan.malformed {
        println!("  (malformed: no position component)");
    }
    println!(
        "  Source: stride {} (one {}, align {})",
        source.record_stride, source.one_size, source.alignment
    );
    println!("  Canonical: stride {}", canonical.stride);
    for (name, slot) in [
        ("w0", canonical.w0),
        ("w1", canonical.w1),
        ("uv", canonical.uv),
        ("color0", canonical.color0),
        ("normal", canonical.normal),
        ("position", canonical.position),
    ] {
        if slot.is_present() {
            println!("    {:<8} {:?} @ {}", name, slot.format, slot.offset);
        }
    }
    println!("  Steps:");
    for step in &plan.steps {
        println!("    {:?} src {} -> dst {}", step.kind, step.src, step.dst);
    }
}

fn replay(path: &Path, json: bool, config: &BackendConfig) -> Result<()> {
    info!("Loading capture from: {}", path.display());
    let capture = DrawCapture::load_from_file(path)?;
    info!(
        "Capture '{}' taken {} ({} draws)",
        capture.metadata.description,
        capture.metadata.timestamp,
        capture.draws.len()
    );

    let mut engine = DrawEngine::new(config);
    let mut sink = CollectingSink::default();
    let consumed = capture.replay(&mut engine, &mut sink)?;
    info!("Consumed {} bytes of vertex data", consumed);

    if json {
        let text = serde_json::to_string_pretty(&sink.batches)?;
        println!("{}", text);
        return Ok(());
    }

    for (n, batch) in sink.batches.iter().enumerate() {
        let plan = engine.plan_for(batch.vert_type);
        print_batch(n, batch, &plan);
    }
    Ok(())
}

fn print_batch(n: usize, batch: &OwnedBatch, plan: &VertexPlan) {
    println!(
        "Batch {}: {} draws, {} vertices, full alpha {}",
        n,
        batch.draws.len(),
        batch.vertex_count(),
        batch.vertex_full_alpha
    );
    for v in 0..batch.vertex_count() {
        let record = batch.record(v);
        print!("  [{:4}]", v);
        for (name, slot) in [
            ("uv", plan.canonical.uv),
            ("c", plan.canonical.color0),
            ("n", plan.canonical.normal),
            ("pos", plan.canonical.position),
        ] {
            if slot.is_present() {
                print!(" {}={:?}", name, slot.values(record));
            }
        }
        println!();
    }
}

#[derive(Serialize)]
struct SimulationReport {
    frames: u32,
    framebuffers: Vec<FramebufferInfo>,
    backend: BackendStats,
}

/// Double-buffered rendering plus a render-to-texture pass every few frames
fn simulate(frames: u32, config: &BackendConfig) -> Result<()> {
    const FRONT: u32 = 0x0000_0000;
    const BACK: u32 = 0x0008_8000;
    const OFFSCREEN: u32 = 0x0011_0000;

    let mut backend = HeadlessBackend::default();
    let mut memory = PspMemory::new();
    let mut manager = FramebufferManager::new(config);

    for frame in 0..frames {
        let target = if frame % 2 == 0 { FRONT } else { BACK };

        if frame % 4 == 0 {
            let request = RenderRequest::new(OFFSCREEN, BufferFormat::Rgb565, 256, 256);
            let offscreen = manager.set_render_framebuffer(&mut backend, &request)?;
            manager.bind_framebuffer_as_texture(&mut backend, offscreen, 0)?;
        }

        let mut request = RenderRequest::new(target, BufferFormat::Rgba8888, 480, 272);
        request.fb_stride = 512;
        manager.set_render_framebuffer(&mut backend, &request)?;

        manager.set_display_framebuffer(VRAM_BASE | target, 512, BufferFormat::Rgba8888);
        manager.copy_display_to_output(&mut backend, &memory);
        let evicted = manager.decimate_framebuffers(&mut backend, &mut memory);
        if evicted > 0 {
            info!("Frame {}: evicted {} framebuffers", frame, evicted);
        }
        manager.end_frame(&mut backend);
    }

    let report = SimulationReport {
        frames,
        framebuffers: manager.framebuffer_list(),
        backend: backend.stats(),
    };
    manager.device_lost(&mut backend);

    let text = serde_json::to_string_pretty(&report)?;
    println!("{}", text);
    Ok(())
}
