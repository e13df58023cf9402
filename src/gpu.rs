//! Graphics requests that write data to GPU resources.
//!
//! These are the typical contents of the graphics queue: a loader prepares
//! the bytes off-thread and the write itself happens on the render thread,
//! within the frame budget.
//!
//! Both requests validate their destination before touching the queue, so a
//! bad upload shows up as a failed request in the log instead of a wgpu
//! validation panic.

use anyhow::{bail, ensure};
use image::RgbaImage;

use crate::request::Request;

/// Copy bytes into a buffer at an offset.
#[derive(Debug)]
pub struct BufferWrite {
    pub label: String,
    pub queue: wgpu::Queue,
    pub buffer: wgpu::Buffer,
    pub offset: wgpu::BufferAddress,
    pub data: Vec<u8>,
}

impl BufferWrite {
    pub fn new(
        label: &str,
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        offset: wgpu::BufferAddress,
        data: Vec<u8>,
    ) -> Self {
        Self {
            label: label.to_string(),
            queue: queue.clone(),
            buffer: buffer.clone(),
            offset,
            data,
        }
    }

    /// Upload a slice of plain-old-data values, e.g. vertices or instance transforms.
    pub fn from_pod<T: bytemuck::Pod>(
        label: &str,
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        offset: wgpu::BufferAddress,
        values: &[T],
    ) -> Self {
        Self::new(label, queue, buffer, offset, bytemuck::cast_slice(values).to_vec())
    }

    fn validate(&self) -> anyhow::Result<()> {
        let size = self.data.len() as wgpu::BufferAddress;
        ensure!(
            self.buffer.usage().contains(wgpu::BufferUsages::COPY_DST),
            "buffer is missing COPY_DST usage"
        );
        ensure!(
            self.offset % wgpu::COPY_BUFFER_ALIGNMENT == 0
                && size % wgpu::COPY_BUFFER_ALIGNMENT == 0,
            "offset {} and size {} must be multiples of {}",
            self.offset,
            size,
            wgpu::COPY_BUFFER_ALIGNMENT
        );
        match self.offset.checked_add(size) {
            Some(end) if end <= self.buffer.size() => Ok(()),
            _ => bail!(
                "write of {} bytes at offset {} overruns buffer of {} bytes",
                size,
                self.offset,
                self.buffer.size()
            ),
        }
    }
}

impl Request for BufferWrite {
    fn execute(self: Box<Self>) -> anyhow::Result<()> {
        self.validate()?;
        if self.data.is_empty() {
            return Ok(());
        }
        self.queue.write_buffer(&self.buffer, self.offset, &self.data);
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Upload an RGBA8 image into mip level 0 of a 2D texture.
#[derive(Debug)]
pub struct TextureWrite {
    pub label: String,
    pub queue: wgpu::Queue,
    pub texture: wgpu::Texture,
    pub image: RgbaImage,
}

impl TextureWrite {
    pub fn new(label: &str, queue: &wgpu::Queue, texture: &wgpu::Texture, image: RgbaImage) -> Self {
        Self {
            label: label.to_string(),
            queue: queue.clone(),
            texture: texture.clone(),
            image,
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) and prepare its upload.
    ///
    /// Decoding is the expensive part, so call this on a loader thread and
    /// submit the result to the graphics queue.
    pub fn from_bytes(
        label: &str,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        bytes: &[u8],
    ) -> anyhow::Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(label, queue, texture, image))
    }

    fn validate(&self) -> anyhow::Result<()> {
        let size = self.texture.size();
        let (width, height) = self.image.dimensions();
        ensure!(
            self.texture.usage().contains(wgpu::TextureUsages::COPY_DST),
            "texture is missing COPY_DST usage"
        );
        ensure!(
            matches!(
                self.texture.format(),
                wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb
            ),
            "texture format {:?} is not RGBA8",
            self.texture.format()
        );
        ensure!(
            self.texture.dimension() == wgpu::TextureDimension::D2,
            "texture is not two-dimensional"
        );
        ensure!(
            size.width == width && size.height == height,
            "image is {}x{} but texture is {}x{}",
            width,
            height,
            size.width,
            size.height
        );
        Ok(())
    }
}

impl Request for TextureWrite {
    fn execute(self: Box<Self>) -> anyhow::Result<()> {
        self.validate()?;
        let (width, height) = self.image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            self.image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
