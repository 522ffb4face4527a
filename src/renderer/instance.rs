use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix};

use crate::math::Color;

/// Per-draw instance payload as the shaders see it.
///
/// 144 bytes: model matrix, direction-preserving matrix, packed color and
/// 12 bytes of padding to the storage-buffer stride. Built fresh for every
/// draw call; never persisted past the frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceRecord {
    pub model: [[f32; 4]; 4],
    /// Transforms directions (normals) under the model's rotation and
    /// scale: inverse transpose of the upper 3x3.
    pub direction_preserving: [[f32; 4]; 4],
    pub color: u32,
    _padding: [u32; 3],
}

/// Stride of one [`InstanceRecord`] in the instance storage buffer.
pub const INSTANCE_RECORD_SIZE: usize = std::mem::size_of::<InstanceRecord>();

impl InstanceRecord {
    pub fn new(model: Matrix4<f32>, color: Color) -> Self {
        Self {
            model: model.into(),
            direction_preserving: direction_preserving_matrix(&model).into(),
            color: color.to_u32(),
            _padding: [0; 3],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Inverse transpose of the upper 3x3 of `model`, widened back to 4x4.
/// A singular basis (zero scale on some axis) falls back to the basis
/// itself rather than poisoning the record with NaNs.
fn direction_preserving_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    let basis = Matrix3::from_cols(
        model.x.truncate(),
        model.y.truncate(),
        model.z.truncate(),
    );
    let inverse_transpose = basis.invert().map(|inv| inv.transpose()).unwrap_or(basis);
    Matrix4::from(inverse_transpose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rad, Vector3};

    #[test]
    fn record_is_144_bytes() {
        assert_eq!(INSTANCE_RECORD_SIZE, 144);
    }

    #[test]
    fn identity_model_keeps_identity_directions() {
        let record = InstanceRecord::new(Matrix4::from_scale(1.0), Color::WHITE);
        let expected: [[f32; 4]; 4] = Matrix4::from_scale(1.0f32).into();
        assert_eq!(record.direction_preserving, expected);
    }

    #[test]
    fn rotation_is_direction_preserving_as_is() {
        // Orthonormal basis: inverse transpose equals the basis.
        let rotation = Matrix4::from_axis_angle(Vector3::new(0.0, 1.0, 0.0), Rad(0.7));
        let record = InstanceRecord::new(rotation, Color::WHITE);
        let expected: [[f32; 4]; 4] = rotation.into();
        for (col, exp) in record.direction_preserving.iter().zip(expected.iter()) {
            for (a, b) in col.iter().zip(exp.iter()) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn nonuniform_scale_inverts() {
        let scale = Matrix4::from_nonuniform_scale(2.0, 1.0, 4.0);
        let record = InstanceRecord::new(scale, Color::WHITE);
        assert!((record.direction_preserving[0][0] - 0.5).abs() < 1e-6);
        assert!((record.direction_preserving[1][1] - 1.0).abs() < 1e-6);
        assert!((record.direction_preserving[2][2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn singular_basis_does_not_produce_nan() {
        let flat = Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0);
        let record = InstanceRecord::new(flat, Color::WHITE);
        for col in &record.direction_preserving {
            for v in col {
                assert!(v.is_finite());
            }
        }
    }
}
