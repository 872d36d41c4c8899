use crate::math::Vec2;

/// Maps a pointer position in surface pixels to `[0, 1]²`, keeping the
/// top-left origin. `None` for an empty surface.
pub fn normalize_pointer(x: f32, y: f32, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    let u = x / width as f32;
    let v = y / height as f32;
    Some(Vec2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_unit_square() {
        assert_eq!(normalize_pointer(0.0, 0.0, 200, 100), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(normalize_pointer(200.0, 100.0, 200, 100), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(normalize_pointer(50.0, 75.0, 200, 100), Some(Vec2::new(0.25, 0.75)));
    }

    #[test]
    fn outside_positions_are_clamped() {
        assert_eq!(normalize_pointer(-10.0, 300.0, 200, 100), Some(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn empty_surface_has_no_pointer() {
        assert_eq!(normalize_pointer(1.0, 1.0, 0, 100), None);
    }
}
