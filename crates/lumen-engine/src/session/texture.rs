use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::assets::{AssetResult, AssetSource};
use crate::backend::{BackendError, Image, Rasterizer, TextureId};

struct Pending {
    id: &'static str,
    texture: TextureId,
    receiver: Receiver<AssetResult>,
}

/// Textures of one session: a placeholder per id until its asset arrives.
#[derive(Default)]
pub(crate) struct TextureSlots {
    handles: BTreeMap<&'static str, TextureId>,
    pending: Vec<Pending>,
}

impl TextureSlots {
    /// Creates the texture for `id` with a 1x1 `placeholder` and starts
    /// loading the real image. A repeated `id` shares the first texture.
    pub(crate) fn request<G: Rasterizer + ?Sized>(
        &mut self,
        backend: &mut G,
        assets: &dyn AssetSource,
        id: &'static str,
        placeholder: [u8; 4],
    ) -> Result<TextureId, BackendError> {
        if let Some(&texture) = self.handles.get(id) {
            log::debug!("texture `{id}` requested twice; sharing handle {texture}");
            return Ok(texture);
        }
        let texture = backend.create_texture()?;
        self.handles.insert(id, texture);
        backend.upload_texture(texture, &Image::solid(1, 1, placeholder))?;
        self.pending.push(Pending {
            id,
            texture,
            receiver: assets.request(id),
        });
        Ok(texture)
    }

    /// Uploads every image that arrived since the last poll, calling
    /// `on_loaded` once per replaced texture.
    ///
    /// A failed load keeps its placeholder and is only logged. A failed upload
    /// does not stop the others; the first such error is returned once every
    /// arrived image has been handled.
    pub(crate) fn poll<G: Rasterizer + ?Sized>(
        &mut self,
        backend: &mut G,
        mut on_loaded: impl FnMut(),
    ) -> Result<(), BackendError> {
        let mut first_error = None;
        let mut i = 0;
        while i < self.pending.len() {
            let received = match self.pending[i].receiver.try_recv() {
                Err(TryRecvError::Empty) => {
                    i += 1;
                    continue;
                }
                received => received,
            };
            let slot = self.pending.swap_remove(i);
            match received {
                Ok(Ok(image)) => match upload(backend, slot.texture, &image) {
                    Ok(()) => {
                        log::debug!(
                            "texture `{}` loaded ({}x{})",
                            slot.id,
                            image.width(),
                            image.height()
                        );
                        on_loaded();
                    }
                    Err(err) => {
                        log::warn!("texture `{}` upload failed: {err}", slot.id);
                        first_error.get_or_insert(err);
                    }
                },
                Ok(Err(err)) => log::warn!("{err}; keeping placeholder"),
                Err(_) => {
                    log::warn!("asset `{}` was dropped without an answer", slot.id);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn handles(&self) -> &BTreeMap<&'static str, TextureId> {
        &self.handles
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Deletes every texture and abandons outstanding loads.
    pub(crate) fn release_all<G: Rasterizer + ?Sized>(&mut self, backend: &mut G) {
        self.pending.clear();
        for (_, texture) in std::mem::take(&mut self.handles) {
            backend.delete_texture(texture);
        }
    }
}

fn upload<G: Rasterizer + ?Sized>(
    backend: &mut G,
    texture: TextureId,
    image: &Image,
) -> Result<(), BackendError> {
    backend.upload_texture(texture, image)?;
    backend.generate_mipmaps(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, ManualAssetSource};
    use crate::backend::HeadlessBackend;

    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn poll_count(slots: &mut TextureSlots, backend: &mut HeadlessBackend) -> Result<usize, BackendError> {
        let mut loaded = 0;
        slots.poll(backend, || loaded += 1)?;
        Ok(loaded)
    }

    #[test]
    fn placeholder_until_completion() {
        let mut backend = HeadlessBackend::default();
        let assets = ManualAssetSource::new();
        let mut slots = TextureSlots::default();
        let tex = slots.request(&mut backend, &assets, "wood.png", BLUE).unwrap();

        assert_eq!(backend.texture_levels(tex).unwrap()[0].pixel(0, 0), BLUE);
        assert_eq!(poll_count(&mut slots, &mut backend), Ok(0));
        assert_eq!(slots.pending(), 1);

        assets.complete("wood.png", Ok(Image::solid(4, 2, [9, 9, 9, 255])));
        assert_eq!(poll_count(&mut slots, &mut backend), Ok(1));
        assert_eq!(slots.pending(), 0);
        assert_eq!(backend.texture_levels(tex).unwrap().len(), 3);
    }

    #[test]
    fn failed_load_keeps_placeholder() {
        let mut backend = HeadlessBackend::default();
        let assets = ManualAssetSource::new();
        let mut slots = TextureSlots::default();
        let tex = slots.request(&mut backend, &assets, "a.png", BLUE).unwrap();

        assets.complete("a.png", Err(AssetError::new("a.png", "corrupt")));
        assert_eq!(poll_count(&mut slots, &mut backend), Ok(0));
        assert_eq!(slots.pending(), 0);
        assert_eq!(backend.texture_levels(tex).unwrap()[0].pixel(0, 0), BLUE);
    }

    #[test]
    fn release_deletes_textures() {
        let mut backend = HeadlessBackend::default();
        let assets = ManualAssetSource::new();
        let mut slots = TextureSlots::default();
        slots.request(&mut backend, &assets, "a.png", BLUE).unwrap();
        slots.request(&mut backend, &assets, "b.png", BLUE).unwrap();

        slots.release_all(&mut backend);
        assert_eq!(backend.live_handles(), 0);
        assert!(slots.handles().is_empty());
        assert_eq!(assets.complete("a.png", Ok(Image::solid(1, 1, BLUE))), 0);
    }

    #[test]
    fn repeated_id_shares_one_texture() {
        let mut backend = HeadlessBackend::default();
        let assets = ManualAssetSource::new();
        let mut slots = TextureSlots::default();
        let first = slots.request(&mut backend, &assets, "wood.png", BLUE).unwrap();
        let second = slots.request(&mut backend, &assets, "wood.png", BLUE).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.handle_counts().textures, 1);
        assert_eq!(slots.pending(), 1);

        slots.release_all(&mut backend);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn failed_upload_does_not_hide_other_completions() {
        let mut backend = HeadlessBackend::default();
        let assets = ManualAssetSource::new();
        let mut slots = TextureSlots::default();
        let a = slots.request(&mut backend, &assets, "a.png", BLUE).unwrap();
        let b = slots.request(&mut backend, &assets, "b.png", BLUE).unwrap();
        let c = slots.request(&mut backend, &assets, "c.png", BLUE).unwrap();
        backend.delete_texture(b);

        for id in ["a.png", "b.png", "c.png"] {
            assets.complete(id, Ok(Image::solid(2, 2, [7, 7, 7, 255])));
        }
        let mut loaded = 0;
        let result = slots.poll(&mut backend, || loaded += 1);

        assert!(matches!(result, Err(BackendError::UnknownHandle { .. })));
        assert_eq!(loaded, 2);
        assert_eq!(slots.pending(), 0);
        assert_eq!(backend.texture_levels(a).unwrap().len(), 2);
        assert_eq!(backend.texture_levels(c).unwrap().len(), 2);
    }
}
