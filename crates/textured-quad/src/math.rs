pub use glam::*;

/// Column-major floats, the layout HLSL expects for a `float4x4` in a
/// constant buffer by default.
pub fn mat4_to_cols(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}
