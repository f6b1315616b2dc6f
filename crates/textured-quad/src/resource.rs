//! Descriptions of the GPU resources the quad needs.
//!
//! A resource is one [`GpuResourceDesc`]; what kind of buffer or texture it
//! is lives in the [`ResourceKind`] tag, and each kind has a constructor
//! function below. Backends turn the description into a real allocation.

use bytemuck::{Pod, Zeroable};

/// Constant buffers are placed at 256-byte boundaries.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

macro_rules! align {
    ($value:expr, $alignment:expr) => {
        ($value + $alignment - 1) & (!($alignment - 1))
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn size(self) -> u32 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Constant,
    Vertex { stride: u32 },
    Index { format: IndexFormat },
    Texture { width: u32, height: u32, mip_levels: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuResourceDesc {
    pub kind: ResourceKind,
    pub size_in_bytes: u64,
    pub name: String,
}

impl GpuResourceDesc {
    pub fn element_count(&self) -> u32 {
        let count = match self.kind {
            ResourceKind::Constant => 1,
            ResourceKind::Vertex { stride } => self.size_in_bytes / u64::from(stride),
            ResourceKind::Index { format } => self.size_in_bytes / u64::from(format.size()),
            ResourceKind::Texture { width, height, .. } => u64::from(width) * u64::from(height),
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

pub fn constant_buffer<T: Pod>(name: &str) -> GpuResourceDesc {
    GpuResourceDesc {
        kind: ResourceKind::Constant,
        size_in_bytes: align!(std::mem::size_of::<T>() as u64, CONSTANT_BUFFER_ALIGNMENT),
        name: name.into(),
    }
}

pub fn vertex_buffer<T: Pod>(vertices: &[T], name: &str) -> GpuResourceDesc {
    GpuResourceDesc {
        kind: ResourceKind::Vertex {
            stride: std::mem::size_of::<T>() as u32,
        },
        size_in_bytes: std::mem::size_of_val(vertices) as u64,
        name: name.into(),
    }
}

pub fn index_buffer(indices: &[u16], name: &str) -> GpuResourceDesc {
    GpuResourceDesc {
        kind: ResourceKind::Index {
            format: IndexFormat::U16,
        },
        size_in_bytes: std::mem::size_of_val(indices) as u64,
        name: name.into(),
    }
}

pub fn texture2d(image: &TextureImage, name: &str) -> GpuResourceDesc {
    GpuResourceDesc {
        kind: ResourceKind::Texture {
            width: image.width,
            height: image.height,
            mip_levels: 1,
        },
        size_in_bytes: image.pixels.len() as u64 * 4,
        name: name.into(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MaterialConstants {
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TransformConstants {
    pub matrix: [f32; 16],
}

/// RGBA8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl TextureImage {
    pub fn row_pitch(&self) -> u32 {
        self.width * 4
    }

    pub fn slice_pitch(&self) -> u32 {
        self.row_pitch() * self.height
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// A two-colour checkerboard with square cells of `cell` pixels.
    pub fn checkerboard(width: u32, height: u32, cell: u32, even: [u8; 4], odd: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    if ((x / cell) + (y / cell)) % 2 == 0 {
                        even
                    } else {
                        odd
                    }
                })
            })
            .collect();

        Self {
            width,
            height,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_buffers_are_256_byte_aligned() {
        assert_eq!(constant_buffer::<MaterialConstants>("material").size_in_bytes, 256);
        assert_eq!(constant_buffer::<TransformConstants>("transform").size_in_bytes, 256);
        assert_eq!(constant_buffer::<[f32; 96]>("big").size_in_bytes, 512);
    }

    #[test]
    fn buffer_sizes_follow_contents() {
        let vertices = [Vertex::default(); 4];
        let desc = vertex_buffer(&vertices, "vertices");
        assert_eq!(desc.kind, ResourceKind::Vertex { stride: 20 });
        assert_eq!(desc.size_in_bytes, 80);
        assert_eq!(desc.element_count(), 4);

        let desc = index_buffer(&[0, 1, 2, 1, 2, 3], "indices");
        assert_eq!(desc.size_in_bytes, 12);
        assert_eq!(desc.element_count(), 6);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let white = [255; 4];
        let black = [0, 0, 0, 255];
        let image = TextureImage::checkerboard(4, 4, 2, white, black);

        assert_eq!(image.pixels.len(), 16);
        assert_eq!(image.pixels[0], white);
        assert_eq!(image.pixels[2], black);
        assert_eq!(image.pixels[2 * 4], black);
        assert_eq!(image.pixels[2 * 4 + 2], white);
        assert_eq!(image.bytes().len(), 64);
        assert_eq!(image.slice_pitch(), 64);

        let desc = texture2d(&image, "texture");
        assert_eq!(desc.size_in_bytes, 64);
        assert_eq!(desc.element_count(), 16);
    }
}
