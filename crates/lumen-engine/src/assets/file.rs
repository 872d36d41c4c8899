use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use crate::backend::Image;

use super::{AssetError, AssetResult, AssetSource};

/// Loads PNG/JPEG files relative to a root directory on a worker thread.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FileAssetSource {
    fn request(&self, id: &str) -> mpsc::Receiver<AssetResult> {
        let (tx, rx) = mpsc::channel();
        let path = self.root.join(id);
        let id = id.to_string();
        let fallback = tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("lumen-asset {id}"))
            .spawn({
                let id = id.clone();
                move || {
                    let result = decode_file(&id, &path);
                    // The session may be gone already.
                    let _ = tx.send(result);
                }
            });
        if let Err(err) = spawned {
            let _ = fallback.send(Err(AssetError::new(&id, format!("worker thread: {err}"))));
        }
        rx
    }
}

/// Decodes `path` into tightly packed RGBA8.
pub fn decode_file(id: &str, path: &Path) -> AssetResult {
    log::debug!("loading asset `{id}` from {}", path.display());
    let decoded = image::open(path)
        .map_err(|e| AssetError::new(id, e.to_string()))?
        .to_rgba8();
    let (width, height) = (decoded.width(), decoded.height());
    Image::from_rgba8(width, height, decoded.into_raw())
        .map_err(|e| AssetError::new(id, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_reports_error() {
        let source = FileAssetSource::new(std::env::temp_dir().join("lumen-no-such-dir"));
        let result = source
            .request("missing.png")
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        assert_eq!(result.unwrap_err().id, "missing.png");
    }

    #[test]
    fn decodes_png_from_disk() {
        let dir = std::env::temp_dir().join(format!("lumen-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let pixels: Vec<u8> = [255u8, 0, 0, 255].repeat(6);
        image::save_buffer(
            dir.join("red.png"),
            &pixels,
            3,
            2,
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();

        let image = FileAssetSource::new(&dir)
            .request("red.png")
            .recv_timeout(Duration::from_secs(10))
            .unwrap()
            .unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixel(2, 1), [255, 0, 0, 255]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
