use std::sync::Arc;

use crate::foundation::error::{AvatarError, AvatarResult};

/// Decoded raster in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Alpha of the pixel at `(x, y)`.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4 + 3;
        self.rgba8_premul[i]
    }
}

/// Decode any format the `image` crate understands into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> AvatarResult<PreparedImage> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| AvatarError::decode(e.to_string()))?
        .into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AvatarError::decode("image has zero dimensions"));
    }

    let mut px = rgba.into_raw();
    premultiply_rgba8_in_place(&mut px);
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(px),
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * a + 127) / 255) as u8;
        }
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
