//! # Scene Inspection
//!
//! Loads a scene on a headless device, prints its tables and bounds and renders
//! one offscreen frame with the bounding-box overlay.
//!
//! ```text
//! cargo run --example inspect_scene -- assets/sponza.obj [scene.toml]
//! ```

use anyhow::{bail, Context};
use cairn::gfx::backend::WgpuBackend;
use cairn::gfx::rendering::{FrameParams, SceneRenderer};
use cairn::gfx::resources::TextureResource;
use cairn::{SceneBuilder, SceneConfig};

const FRAME_SIZE: u32 = 512;
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(scene_path) = args.next() else {
        bail!("usage: inspect_scene <scene file> [config.toml]");
    };
    let config = match args.next() {
        Some(path) => SceneConfig::load_from_file(&path)
            .with_context(|| format!("reading config {}", path))?,
        None => SceneConfig::default(),
    };

    let backend = pollster::block_on(WgpuBackend::headless()).context("creating device")?;
    let scene = SceneBuilder::new(&backend)
        .with_config(config)
        .load(&scene_path)
        .with_context(|| format!("loading {}", scene_path))?;

    let stats = scene.statistics();
    println!("{}", scene_path);
    println!("  nodes      {}", stats.node_count);
    println!("  meshes     {}", stats.mesh_count);
    println!("  materials  {}", stats.material_count);
    println!("  textures   {}", stats.texture_count);
    println!("  vertices   {}", stats.vertex_count);
    println!("  triangles  {}", stats.triangle_count);
    println!(
        "  extent     {:?} .. {:?}",
        scene.aabb().lower,
        scene.aabb().upper
    );

    if let Some(bounds) = scene.bounds() {
        for (mesh, corners) in scene.meshes().iter().zip(bounds) {
            println!(
                "  {:<24} {:?} .. {:?}",
                mesh.name,
                corners.lower(),
                corners.upper()
            );
        }
    } else {
        println!("  no bounding boxes");
    }

    let device = backend.device();
    let queue = backend.queue();
    let mut renderer = SceneRenderer::new(&backend, FRAME_FORMAT)?;
    let params = FrameParams::looking_at_origin(1.0).with_bounding_boxes(true);
    renderer.prepare(queue, &params);

    let target =
        TextureResource::create_render_target(device, FRAME_SIZE, FRAME_SIZE, FRAME_FORMAT, "Frame");
    let depth = TextureResource::create_depth_texture(device, FRAME_SIZE, FRAME_SIZE, "Frame Depth");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Inspect Frame"),
    });
    let frame_stats = {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.1,
                        b: 0.12,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        renderer.draw(&mut pass, &scene, &params)?
    };
    queue.submit(Some(encoder.finish()));
    device
        .poll(wgpu::MaintainBase::Wait)
        .context("waiting for frame")?;

    println!(
        "frame: {} mesh draws, {} boxes, pipelines {:?}",
        frame_stats.meshes.draws,
        frame_stats.overlay.draws,
        renderer.pipeline_stats()
    );
    Ok(())
}
