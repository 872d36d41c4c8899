use super::types::Image;

/// Number of levels in a full mip chain for `width x height`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Box-filtered mip chain, level 0 first, down to 1x1.
///
/// Each texel of level `n + 1` averages the 2x2 block below it; odd edges
/// reuse the last row or column.
pub fn mip_chain(base: &Image) -> Vec<Image> {
    let mut levels = vec![base.clone()];
    while let Some(prev) = levels.last() {
        if prev.width() == 1 && prev.height() == 1 {
            break;
        }
        let next = downsample(prev);
        levels.push(next);
    }
    levels
}

fn downsample(src: &Image) -> Image {
    let w = (src.width() / 2).max(1);
    let h = (src.height() / 2).max(1);
    let mut pixels = Vec::with_capacity(w as usize * h as usize * 4);

    for y in 0..h {
        let y0 = (y * 2).min(src.height() - 1);
        let y1 = (y * 2 + 1).min(src.height() - 1);
        for x in 0..w {
            let x0 = (x * 2).min(src.width() - 1);
            let x1 = (x * 2 + 1).min(src.width() - 1);
            let texels = [src.pixel(x0, y0), src.pixel(x1, y0), src.pixel(x0, y1), src.pixel(x1, y1)];
            for c in 0..4 {
                let sum: u32 = texels.iter().map(|t| u32::from(t[c])).sum();
                pixels.push(((sum + 2) / 4) as u8);
            }
        }
    }

    Image::from_parts(w, h, pixels)
}
