use kurbo::Point;

use crate::{
    assets::decode::PreparedImage,
    autoframe::focus::AlphaFocus,
    foundation::{
        core::FrameRGBA,
        error::{AvatarError, AvatarResult},
    },
};

/// Rasterize one autoframed tile of `tile x tile` pixels.
///
/// The image is laid out over the whole tile, then moved by the focus transform; whatever falls
/// outside the tile is clipped. Sampling is nearest-neighbour. An empty image, or one whose
/// buffer is shorter than its dimensions claim, yields clear pixels where samples are missing.
pub fn render_thumbnail(img: &PreparedImage, focus: &AlphaFocus, tile: u32) -> FrameRGBA {
    let mut out = FrameRGBA::transparent(tile, tile);
    if tile == 0 || img.width == 0 || img.height == 0 {
        return out;
    }
    let t = f64::from(tile);
    let inv = focus.transform().to_affine(t, t).inverse();
    let (sx, sy) = (f64::from(img.width) / t, f64::from(img.height) / t);

    for y in 0..tile {
        for x in 0..tile {
            let p = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if p.x < 0.0 || p.y < 0.0 || p.x >= t || p.y >= t {
                continue;
            }
            let u = ((p.x * sx) as u32).min(img.width - 1) as usize;
            let v = ((p.y * sy) as u32).min(img.height - 1) as usize;
            let si = (v * img.width as usize + u) * 4;
            let Some(px) = img.rgba8_premul.get(si..si + 4) else {
                continue;
            };
            let di = (y as usize * tile as usize + x as usize) * 4;
            out.data[di..di + 4].copy_from_slice(px);
        }
    }
    out
}

/// Arrange equally sized tiles into a grid, row-major.
pub fn contact_sheet(tiles: &[FrameRGBA], columns: u32) -> AvatarResult<FrameRGBA> {
    let Some(first) = tiles.first() else {
        return Err(AvatarError::validation("contact sheet needs at least one tile"));
    };
    if columns == 0 {
        return Err(AvatarError::validation("contact sheet needs at least one column"));
    }
    let (tw, th) = (first.width, first.height);
    if tiles.iter().any(|t| t.width != tw || t.height != th) {
        return Err(AvatarError::validation("contact sheet tiles must share one size"));
    }

    let cols = columns.min(tiles.len() as u32);
    let rows = (tiles.len() as u32).div_ceil(cols);
    let mut sheet = FrameRGBA::transparent(tw * cols, th * rows);
    let row_bytes = tw as usize * 4;

    for (i, tile) in tiles.iter().enumerate() {
        let (col, row) = (i as u32 % cols, i as u32 / cols);
        for y in 0..th {
            let src = y as usize * row_bytes;
            let dst = ((row * th + y) as usize * sheet.width as usize + (col * tw) as usize) * 4;
            sheet.data[dst..dst + row_bytes].copy_from_slice(&tile.data[src..src + row_bytes]);
        }
    }
    Ok(sheet)
}
