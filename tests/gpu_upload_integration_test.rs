#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn gpu_or_skip() -> Option<(wgpu::Device, wgpu::Queue)> {
    let gpu = crate::common::test_utils::headless_gpu();
    if gpu.is_none() {
        println!("No GPU adapter available, skipping");
    }
    gpu
}

#[test]
#[cfg(feature = "integration-tests")]
fn buffer_writes_run_and_bad_ones_fail_without_stopping_the_queue() {
    use flow_processing::{FrameBudgetProcessor, InstantClock, gpu::BufferWrite};

    let Some((device, queue)) = gpu_or_skip() else {
        return;
    };
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Upload Target"),
        size: 64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let read_only = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("No Copy Dst"),
        size: 64,
        usage: wgpu::BufferUsages::VERTEX,
        mapped_at_creation: false,
    });

    let mut processor = FrameBudgetProcessor::new(InstantClock::new(), 8.0);
    processor.enqueue(BufferWrite::from_pod(
        "vertices",
        &queue,
        &buffer,
        0,
        &[0.0f32, 1.0, 2.0, 3.0],
    ));
    processor.enqueue(BufferWrite::new("overrun", &queue, &buffer, 60, vec![0; 8]));
    processor.enqueue(BufferWrite::new("unaligned", &queue, &buffer, 2, vec![0; 4]));
    processor.enqueue(BufferWrite::new("read only", &queue, &read_only, 0, vec![0; 4]));
    processor.enqueue(BufferWrite::from_pod("tail", &queue, &buffer, 48, &[7u32; 4]));

    let report = processor.process_all();

    assert_eq!(report.executed, 5);
    assert_eq!(report.failed, 3);
    queue.submit([]);
}

#[test]
#[cfg(feature = "integration-tests")]
fn texture_write_checks_dimensions() {
    use flow_processing::{FrameBudgetProcessor, InstantClock, gpu::TextureWrite};

    let Some((device, queue)) = gpu_or_skip() else {
        return;
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Upload Texture"),
        size: wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let fits = image::RgbaImage::from_pixel(4, 4, image::Rgba([127, 127, 255, 255]));
    let too_big = image::RgbaImage::new(8, 8);

    let mut processor = FrameBudgetProcessor::new(InstantClock::new(), 8.0);
    processor.enqueue(TextureWrite::new("normal map", &queue, &texture, fits));
    processor.enqueue(TextureWrite::new("wrong size", &queue, &texture, too_big));

    let report = processor.process_all();

    assert_eq!(report.executed, 2);
    assert_eq!(report.failed, 1);
    assert!(TextureWrite::from_bytes("garbage", &queue, &texture, b"not an image").is_err());
}
