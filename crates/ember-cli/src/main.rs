//! Ember CLI - scene editing and shadow rendering from the command line

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{edit, inspect, new, pick, render, CameraArgs};
use config::{EmberConfig, Overrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Interactive scene editor with scene-fitted shadow maps", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to an ember.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Draw entities with the unlit pipeline
    #[arg(long, global = true)]
    unlit: bool,

    /// Disable shadow mapping
    #[arg(long, global = true)]
    no_shadows: bool,

    /// Disable the ground grid
    #[arg(long, global = true)]
    no_grid: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter scene
    New {
        /// Path of the scene file to create
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List entities, lights and fitted shadow frustums
    Inspect {
        /// Path to scene file
        scene: PathBuf,
    },

    /// Click a pixel and report what gets selected
    Pick {
        /// Path to scene file
        scene: PathBuf,

        /// Pixel column, from the left
        #[arg(long)]
        x: f32,

        /// Pixel row, from the top
        #[arg(long)]
        y: f32,

        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        #[command(flatten)]
        camera: CameraArgs,
    },

    /// Render a scene to a PNG image (headless)
    Render {
        /// Path to scene file
        scene: PathBuf,

        /// Output image path
        #[arg(short, long, default_value = "render.png")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        /// Select an object by name to show its outline and gizmo
        #[arg(long)]
        select: Option<String>,

        #[command(flatten)]
        camera: CameraArgs,
    },

    /// Open the interactive editor
    Edit {
        /// Path to scene file
        scene: PathBuf,

        /// Reload the scene when the file changes on disk
        #[arg(long)]
        watch: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EmberConfig::load(cli.config.as_deref())?;
    config.apply(Overrides {
        unlit: cli.unlit,
        no_shadows: cli.no_shadows,
        no_grid: cli.no_grid,
    });

    match cli.command {
        Commands::New { path, force } => new::run(&path, force),
        Commands::Inspect { scene } => inspect::run(&scene, &config),
        Commands::Pick {
            scene,
            x,
            y,
            width,
            height,
            camera,
        } => pick::run(pick::PickArgs {
            scene,
            x,
            y,
            width,
            height,
            camera,
        }, &config),
        Commands::Render {
            scene,
            output,
            width,
            height,
            select,
            camera,
        } => render::run(render::RenderArgs {
            scene,
            output,
            width,
            height,
            select,
            camera,
        }, config),
        Commands::Edit { scene, watch } => edit::run(&scene, watch, config),
    }
}
