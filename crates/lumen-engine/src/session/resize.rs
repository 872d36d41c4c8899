use crate::backend::DisplaySurface;

/// Matches the backing store to the display size.
///
/// Returns `true` when the backing store was changed. Calling it again with
/// unchanged sizes is a no-op.
pub fn sync_backing_size<D: DisplaySurface + ?Sized>(surface: &mut D) -> bool {
    let display = surface.display_size();
    if surface.backing_size() == display {
        return false;
    }
    log::debug!(
        "resizing backing store {:?} -> {}x{}",
        surface.backing_size(),
        display.width,
        display.height
    );
    surface.set_backing_size(display);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, SurfaceSize};

    #[test]
    fn resize_is_idempotent() {
        let mut backend = HeadlessBackend::new(SurfaceSize::new(800, 600));
        assert!(sync_backing_size(&mut backend));
        assert_eq!(backend.backing_size(), SurfaceSize::new(800, 600));
        assert!(!sync_backing_size(&mut backend));
        assert!(!sync_backing_size(&mut backend));
    }

    #[test]
    fn follows_later_display_changes() {
        let mut backend = HeadlessBackend::new(SurfaceSize::new(800, 600));
        sync_backing_size(&mut backend);
        backend.set_display_size(SurfaceSize::new(1024, 768));
        assert!(sync_backing_size(&mut backend));
        assert_eq!(backend.backing_size(), SurfaceSize::new(1024, 768));
    }
}
