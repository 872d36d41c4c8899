use std::fmt;

use crate::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

use super::BackendError;

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle_id!(
    /// Backend shader object.
    ShaderId
);
handle_id!(
    /// Backend program object (a linked vertex + fragment pair).
    ProgramId
);
handle_id!(
    /// Backend vertex or index buffer.
    BufferId
);
handle_id!(
    /// Backend 2D RGBA8 texture.
    TextureId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    /// `u32` indices.
    Index,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
}

/// Physical pixel size of a drawable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 1.0 for an empty surface.
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Element format of one vertex stream. Streams are tightly packed, one
/// attribute per buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
    /// Normalized to `[0, 1]` when fetched.
    Unorm8x4,
}

impl VertexFormat {
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
            VertexFormat::Unorm8x4 => 4,
        }
    }
}

/// One attribute fed from a vertex buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexInput {
    pub location: u32,
    pub buffer: BufferId,
    pub format: VertexFormat,
}

/// What a uniform location refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// Uniform buffer of `size` bytes.
    Buffer { size: u64 },
    Texture,
    Sampler,
}

/// Resolved location of a named uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// Sampling parameters bound alongside a texture.
///
/// `mipmap_filter: None` samples the base level only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SamplerState {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_filter: Option<Filter>,
    pub wrap: Wrap,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmap_filter: Some(Filter::Linear),
            wrap: Wrap::Repeat,
        }
    }
}

impl SamplerState {
    pub const fn new(min_filter: Filter, mag_filter: Filter, mipmap_filter: Option<Filter>) -> Self {
        Self {
            min_filter,
            mag_filter,
            mipmap_filter,
            wrap: Wrap::Repeat,
        }
    }

    pub const fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }
}

/// Value bound to a uniform location for one draw call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    Texture(TextureId),
    Sampler(SamplerState),
}

impl UniformValue {
    /// Uniform-buffer bytes, or `None` for texture and sampler bindings.
    ///
    /// `Mat3` columns are padded to 16 bytes.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let bytes = match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Mat3(m) => bytemuck::cast_slice(&m.to_padded_cols()).to_vec(),
            UniformValue::Mat4(m) => bytemuck::bytes_of(m).to_vec(),
            UniformValue::Texture(_) | UniformValue::Sampler(_) => return None,
        };
        Some(bytes)
    }

    /// Checks the value can be bound at `location`.
    pub fn check(&self, name: &str, location: &UniformLocation) -> Result<(), BackendError> {
        let ok = match (location.kind, self) {
            (UniformKind::Texture, UniformValue::Texture(_)) => true,
            (UniformKind::Sampler, UniformValue::Sampler(_)) => true,
            (UniformKind::Buffer { size }, value) => value
                .to_bytes()
                .is_some_and(|bytes| bytes.len() as u64 == size),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(BackendError::UniformMismatch {
                name: name.to_string(),
                reason: format!("{self:?} does not fit {:?}", location.kind),
            })
        }
    }
}

/// One uniform bound for a draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBinding {
    pub name: String,
    pub location: UniformLocation,
    pub value: UniformValue,
}

/// A single draw submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub vertex_inputs: Vec<VertexInput>,
    pub uniforms: Vec<UniformBinding>,
    pub topology: Topology,
    pub index_buffer: Option<BufferId>,
    /// Vertices, or indices when `index_buffer` is set.
    pub element_count: u32,
}

/// Tightly packed RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BackendError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(BackendError::InvalidImage {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Caller guarantees `pixels.len() == width * height * 4`.
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width.max(1) as usize * height.max(1) as usize;
        Self {
            width: width.max(1),
            height: height.max(1),
            pixels: color.repeat(count),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat3_uniform_is_padded() {
        let bytes = UniformValue::Mat3(Mat3::identity()).to_bytes().unwrap();
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn check_matches_sizes_and_kinds() {
        let mat4 = UniformLocation {
            group: 0,
            binding: 0,
            kind: UniformKind::Buffer { size: 64 },
        };
        assert!(UniformValue::Mat4(Mat4::identity()).check("m", &mat4).is_ok());
        assert!(matches!(
            UniformValue::Float(1.0).check("m", &mat4),
            Err(BackendError::UniformMismatch { .. })
        ));

        let texture = UniformLocation {
            kind: UniformKind::Texture,
            ..mat4
        };
        assert!(UniformValue::Texture(TextureId(3)).check("t", &texture).is_ok());
        assert!(UniformValue::Sampler(SamplerState::default()).check("t", &texture).is_err());
    }

    #[test]
    fn image_rejects_wrong_length() {
        assert!(Image::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(Image::from_rgba8(0, 2, Vec::new()).is_err());
        let img = Image::from_rgba8(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(img.pixel(0, 1), [5, 6, 7, 8]);
    }

    #[test]
    fn solid_fills_every_pixel() {
        let img = Image::solid(3, 2, [0, 0, 255, 255]);
        assert_eq!(img.pixels().len(), 24);
        assert!(img.pixels().chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
    }

    #[test]
    fn aspect_of_empty_surface() {
        assert_eq!(SurfaceSize::new(0, 10).aspect(), 1.0);
        assert_eq!(SurfaceSize::new(200, 100).aspect(), 2.0);
    }
}
