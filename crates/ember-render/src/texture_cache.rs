//! GPU texture cache: entity textures loaded from disk, with a white fallback

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use wgpu::util::DeviceExt;

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Cache of GPU textures keyed by file path
pub struct TextureCache {
    textures: HashMap<String, GpuTexture>,
    /// Paths that failed to load; not retried every frame
    failed: HashSet<String>,
    /// Relative paths resolve against this directory
    base_dir: PathBuf,
    /// 1x1 white texture for untextured entities
    pub default_white: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            textures: HashMap::new(),
            failed: HashSet::new(),
            base_dir: PathBuf::from("."),
            default_white: Self::create_1x1(device, queue, [255, 255, 255, 255], "Default White"),
        }
    }

    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    fn create_1x1(device: &wgpu::Device, queue: &wgpu::Queue, color: [u8; 4], label: &str) -> GpuTexture {
        upload_rgba(device, queue, label, 1, 1, &color, wgpu::AddressMode::ClampToEdge)
    }

    /// Load a texture from an image file on disk.
    /// Returns Ok(true) if newly loaded, Ok(false) if already cached.
    pub fn load_file(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        path: &Path,
    ) -> Result<bool, String> {
        if self.textures.contains_key(name) {
            return Ok(false);
        }

        let rgba = image::open(path)
            .map_err(|e| format!("Failed to open image '{}': {}", path.display(), e))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let texture = upload_rgba(device, queue, name, width, height, &rgba, wgpu::AddressMode::Repeat);
        self.textures.insert(name.to_string(), texture);

        Ok(true)
    }

    /// Make sure an entity texture is resident. Failures are logged once and
    /// the entity keeps rendering with the white fallback.
    pub fn ensure_loaded(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, name: &str) {
        if self.textures.contains_key(name) || self.failed.contains(name) {
            return;
        }
        let path = self.base_dir.join(name);
        match self.load_file(device, queue, name, &path) {
            Ok(_) => log::info!("Loaded texture {}", path.display()),
            Err(e) => {
                log::warn!("{}", e);
                self.failed.insert(name.to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&GpuTexture> {
        self.textures.get(name)
    }

    /// The texture for `name`, or the white fallback
    pub fn get_or_default(&self, name: Option<&str>) -> (&GpuTexture, bool) {
        match name.and_then(|n| self.textures.get(n)) {
            Some(texture) => (texture, true),
            None => (&self.default_white, false),
        }
    }
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
    address_mode: wgpu::AddressMode,
) -> GpuTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{} Sampler", label)),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}
