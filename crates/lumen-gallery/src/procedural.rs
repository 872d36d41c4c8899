use std::sync::mpsc;

use lumen_engine::assets::{AssetError, AssetResult, AssetSource};
use lumen_engine::backend::{BackendError, Image};

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Tints picked by id, so different ids are told apart on screen.
const TINTS: [[u8; 4]; 4] = [
    [128, 0, 255, 255],
    [0, 0, 255, 255],
    [255, 0, 0, 255],
    [0, 160, 80, 255],
];

/// Generates a checkerboard for any id and answers immediately.
///
/// Lets the gallery run without an asset directory on disk.
#[derive(Debug, Clone)]
pub struct ProceduralAssets {
    size: u32,
}

impl Default for ProceduralAssets {
    fn default() -> Self {
        Self { size: 256 }
    }
}

impl ProceduralAssets {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    fn generate(&self, id: &str) -> AssetResult {
        let seed = id
            .bytes()
            .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
        let cells = 2 << (seed % 4);
        let tint = TINTS[(seed as usize / 4) % TINTS.len()];
        checkerboard(self.size, cells, tint, WHITE).map_err(|e| AssetError::new(id, e.to_string()))
    }
}

impl AssetSource for ProceduralAssets {
    fn request(&self, id: &str) -> mpsc::Receiver<AssetResult> {
        let (tx, rx) = mpsc::channel();
        log::debug!("generating procedural texture `{id}`");
        // The receiver is still held here, so the send cannot fail.
        let _ = tx.send(self.generate(id));
        rx
    }
}

/// Square `size` x `size` board of `cells` x `cells` squares, `a` in the
/// top-left corner.
pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Result<Image, BackendError> {
    let cell = (size / cells.max(1)).max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let even = (x / cell + y / cell) % 2 == 0;
            pixels.extend_from_slice(if even { &a } else { &b });
        }
    }
    Image::from_rgba8(size, size, pixels)
}
