use std::collections::BTreeMap;

use crate::math::{Mat4, Vec2, Vec3};

/// Mutable per-session state read by scenes when they compute uniforms.
///
/// Mutated only by parameter commands, pointer input, or the scene's initial
/// value. Rotation is stored in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub scalars: BTreeMap<&'static str, f32>,
    pub flags: BTreeMap<&'static str, bool>,
    pub choices: BTreeMap<&'static str, String>,
    pub selections: BTreeMap<&'static str, Vec<String>>,
    /// Latest pointer position, normalized to `[0, 1]` with the origin at the
    /// top-left corner.
    pub pointer: Option<Vec2>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::splat(1.0),
            scalars: BTreeMap::new(),
            flags: BTreeMap::new(),
            choices: BTreeMap::new(),
            selections: BTreeMap::new(),
            pointer: None,
        }
    }
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_scalar(mut self, key: &'static str, value: f32) -> Self {
        self.scalars.insert(key, value);
        self
    }

    pub fn with_flag(mut self, key: &'static str, value: bool) -> Self {
        self.flags.insert(key, value);
        self
    }

    /// Named scalar, 0.0 when unset.
    pub fn scalar(&self, key: &str) -> f32 {
        self.scalars.get(key).copied().unwrap_or(0.0)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn choice(&self, key: &str) -> Option<&str> {
        self.choices.get(key).map(String::as_str)
    }

    pub fn selection(&self, key: &str) -> &[String] {
        self.selections.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn is_selected(&self, key: &str, option: &str) -> bool {
        self.selection(key).iter().any(|s| s == option)
    }

    /// `translate * rotate_x * rotate_y * rotate_z * scale`.
    pub fn model_matrix(&self) -> Mat4 {
        let t = self.translation;
        let r = self.rotation;
        let s = self.scale;
        Mat4::translation(t.x, t.y, t.z)
            .rotate_x(r.x)
            .rotate_y(r.y)
            .rotate_z(r.z)
            .scale(s.x, s.y, s.z)
    }
}
