use bevy::prelude::*;

/// Rigid transform reported by the platform, valid for the frame it was sampled in.
///
/// The matrix is stored exactly as delivered (column-major, translation in the
/// fourth column) so consumers can copy it without decomposing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    matrix: Mat4,
}

impl Pose {
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Build a pose from the 16 column-major values a platform hands back.
    /// Returns `None` for any other length.
    pub fn from_cols_slice(values: &[f32]) -> Option<Self> {
        if values.len() != 16 {
            return None;
        }
        Some(Self {
            matrix: Mat4::from_cols_slice(values),
        })
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            matrix: Mat4::from_rotation_translation(rotation, translation),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Scene transform equivalent of the matrix, for rendering.
    pub fn to_transform(&self) -> Transform {
        Transform::from_matrix(self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(Pose::from_cols_slice(&[0.0; 12]).is_none());
        assert!(Pose::from_cols_slice(&[0.0; 17]).is_none());
    }

    #[test]
    fn keeps_platform_values_verbatim() {
        let values: Vec<f32> = (0..16).map(|v| v as f32 * 0.5).collect();
        let pose = Pose::from_cols_slice(&values).unwrap();
        assert_eq!(pose.matrix().to_cols_array().to_vec(), values);
    }

    #[test]
    fn translation_comes_from_fourth_column() {
        let pose = Pose::from_translation_rotation(
            Vec3::new(0.25, -1.0, 3.0),
            Quat::from_rotation_y(0.7),
        );
        assert!(pose.translation().abs_diff_eq(Vec3::new(0.25, -1.0, 3.0), 1e-6));

        let transform = pose.to_transform();
        assert!(transform.translation.abs_diff_eq(pose.translation(), 1e-6));
        assert!(transform.scale.abs_diff_eq(Vec3::ONE, 1e-5));
    }
}
