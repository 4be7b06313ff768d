//! Headless offscreen demo: renders a small PBR scene through the full
//! pipeline (shadow, G-buffer, SSAO, bloom, composite) and saves the final
//! image to `offscreen.png`.

use std::sync::Arc;

use glam::Vec3;

use ember::{Entity, GpuContext, Material, Mesh, OrbitCamera, Renderer, Scene};

fn main() -> ember::Result<()> {
    env_logger::init();

    let (width, height) = (1280u32, 720u32);
    let gpu = pollster::block_on(GpuContext::headless())?;
    let mut renderer = Renderer::init(gpu, width, height)?;

    let mut scene = Scene::new();
    scene.set_background(Vec3::new(0.05, 0.06, 0.08));
    scene.light.set_direction(Vec3::new(-0.5, -1.0, -0.4));
    scene.ssao.set_enabled(true);
    scene.bloom.set_enabled(true);
    scene.tone_mapping.set_exposure(1.2);

    // Floor plane.
    let plane = Arc::new(Mesh::plane());
    let mut floor_material = Material::new();
    floor_material.albedo = Vec3::new(0.6, 0.6, 0.62);
    floor_material.roughness = 0.9;
    let mut floor = Entity::new(plane, floor_material);
    floor.scale = Vec3::splat(30.0);
    floor.position.y = -1.0;
    scene.add_entity(floor);

    // Grid of spheres sweeping metallic and roughness.
    let sphere = Arc::new(Mesh::sphere(48, 24));
    for row in 0..5 {
        for col in 0..5 {
            let mut material = Material::new();
            material.albedo = Vec3::new(0.8, 0.2, 0.2);
            material.metallic = row as f32 / 4.0;
            material.roughness = (col as f32 / 4.0).max(0.05);
            material.ao = 1.0;

            let mut entity = Entity::new(Arc::clone(&sphere), material);
            entity.position = Vec3::new(col as f32 * 1.4 - 2.8, 0.0, row as f32 * 1.4 - 2.8);
            scene.add_entity(entity);
        }
    }

    // One emissive cube to feed the bloom pass.
    let cube = Arc::new(Mesh::cube());
    let mut glow_material = Material::new();
    glow_material.albedo = Vec3::ZERO;
    glow_material.emissive = Vec3::new(8.0, 6.0, 2.0);
    let mut glow = Entity::new(cube, glow_material);
    glow.position = Vec3::new(0.0, 1.5, 0.0);
    glow.scale = Vec3::splat(0.5);
    glow.rotation.y = 30.0;
    scene.add_entity(glow);

    let mut camera = OrbitCamera::new(width as f32 / height as f32);
    camera.distance = 9.0;
    camera.pitch = 0.5;
    camera.yaw = 0.8;

    for _ in 0..3 {
        renderer.render(&scene, &camera);
    }

    save_output(&renderer, width, height);
    renderer.shutdown();
    Ok(())
}

/// Copies the final composed image back to the CPU and writes a PNG.
fn save_output(renderer: &Renderer, width: u32, height: u32) {
    let gpu = renderer.gpu();
    let texture = renderer.output_view().texture();

    let bytes_per_row = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    let _ = gpu.device.poll(wgpu::PollType::wait_indefinitely());
    rx.recv()
        .expect("map_async callback dropped")
        .expect("buffer mapping failed");

    let data = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let start = (row * bytes_per_row) as usize;
        pixels.extend_from_slice(&data[start..start + (width * 4) as usize]);
    }
    drop(data);
    buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels)
        .expect("pixel buffer size mismatch")
        .save("offscreen.png")
        .expect("failed to write offscreen.png");
    println!("Wrote offscreen.png ({width}x{height})");
}
