//! Headless scene-to-PNG render command

use super::{load_store, CameraArgs};
use crate::config::EmberConfig;
use anyhow::{Context, Result};
use ember_render::{HeadlessContext, SceneRenderer};
use std::path::{Path, PathBuf};

pub struct RenderArgs {
    pub scene: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub select: Option<String>,
    pub camera: CameraArgs,
}

pub fn run(args: RenderArgs, config: EmberConfig) -> Result<()> {
    let mut store = load_store(&args.scene, &config)?;
    println!("Loaded scene: {}", args.scene.display());
    println!("Objects: {}, lights: {}", store.entity_count(), store.light_count());

    if let Some(name) = &args.select {
        let id = store
            .find_by_name(name)
            .map(|e| e.id())
            .with_context(|| format!("No object named '{}'", name))?;
        store.select_entity(id);
    }

    // Create headless context
    let ctx = pollster::block_on(HeadlessContext::new(args.width, args.height))
        .context("Failed to create headless render context")?;

    let camera = args.camera.build(ctx.aspect_ratio());

    let mut renderer = SceneRenderer::new(&ctx.device, &ctx.queue, ctx.format, config.render);
    let scene_dir = args.scene.parent().unwrap_or_else(|| Path::new("."));
    renderer.set_texture_base_dir(scene_dir);

    renderer.render_to(
        &ctx.device,
        &ctx.queue,
        &ctx.depth.view,
        &ctx.color_view,
        &camera,
        &mut store,
        None,
    );

    // Read back pixels
    let pixels = pollster::block_on(ctx.read_pixels()).context("Failed to read rendered pixels")?;

    // Encode as PNG
    let img = image::RgbaImage::from_raw(ctx.width, ctx.height, pixels)
        .context("Failed to create image from pixel data")?;
    img.save(&args.output)
        .with_context(|| format!("Failed to save image to {}", args.output.display()))?;

    println!(
        "Rendered {}x{} image to {}",
        ctx.width,
        ctx.height,
        args.output.display()
    );

    Ok(())
}
