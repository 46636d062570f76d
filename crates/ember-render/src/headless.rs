//! Offscreen rendering for `ember render`
//!
//! Frames go to an RGBA texture that is copied into a mappable buffer and
//! returned as tightly packed pixel rows.

use crate::context::{gpu_instance, open_gpu, DepthBuffer, Gpu, RenderError};

const BYTES_PER_PIXEL: u32 = 4;

/// Row stride of a texture-to-buffer copy. wgpu pads each row up to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowLayout {
    row_bytes: u32,
    padded_row_bytes: u32,
}

impl RowLayout {
    fn for_width(width: u32) -> Self {
        let row_bytes = width * BYTES_PER_PIXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        Self {
            row_bytes,
            padded_row_bytes: row_bytes.div_ceil(align) * align,
        }
    }

    fn buffer_size(&self, height: u32) -> u64 {
        u64::from(self.padded_row_bytes) * u64::from(height)
    }

    /// Copy `height` rows out of a padded readback, dropping the padding
    fn unpad(&self, data: &[u8], height: u32) -> Vec<u8> {
        let row = self.row_bytes as usize;
        data.chunks(self.padded_row_bytes as usize)
            .take(height as usize)
            .flat_map(|chunk| &chunk[..row.min(chunk.len())])
            .copied()
            .collect()
    }
}

/// A device and color/depth targets with no window attached
pub struct HeadlessContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: DepthBuffer,
}

impl HeadlessContext {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Zero dimensions are clamped to one pixel
    pub async fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        let Gpu { device, queue, .. } =
            open_gpu(&gpu_instance(), None, "Ember Offscreen Device").await?;

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = DepthBuffer::new(&device, width, height);

        log::debug!("Offscreen target {}x{} ready", width, height);

        Ok(Self {
            device,
            queue,
            format: Self::FORMAT,
            width,
            height,
            color_texture,
            color_view,
            depth,
        })
    }

    /// Copy the color target into a new mappable buffer
    fn copy_to_buffer(&self, layout: RowLayout) -> wgpu::Buffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Offscreen Readback"),
            size: layout.buffer_size(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Copy"),
            });
        encoder.copy_texture_to_buffer(
            self.color_texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(layout.padded_row_bytes),
                    rows_per_image: Some(self.height),
                },
            },
            self.color_texture.size(),
        );
        self.queue.submit([encoder.finish()]);
        buffer
    }

    /// Rendered pixels as RGBA8 rows, top row first
    pub async fn read_pixels(&self) -> Result<Vec<u8>, RenderError> {
        let layout = RowLayout::for_width(self.width);
        let buffer = self.copy_to_buffer(layout);

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

        let pixels = layout.unpad(&slice.get_mapped_range(), self.height);
        buffer.unmap();
        Ok(pixels)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        let layout = RowLayout::for_width(3);
        assert_eq!(layout.row_bytes, 12);
        assert_eq!(layout.padded_row_bytes, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        assert_eq!(layout.buffer_size(5), 5 * u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT));

        // 64 pixels is exactly one alignment unit
        let aligned = RowLayout::for_width(64);
        assert_eq!(aligned.padded_row_bytes, aligned.row_bytes);
    }

    #[test]
    fn unpad_drops_row_padding() {
        let layout = RowLayout {
            row_bytes: 8,
            padded_row_bytes: 12,
        };
        let data = [
            1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0, //
            3, 3, 3, 3, 4, 4, 4, 4, 0, 0, 0, 0,
        ];
        assert_eq!(
            layout.unpad(&data, 2),
            [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4]
        );
    }
}
