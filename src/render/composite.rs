use crate::foundation::{
    core::FrameRGBA,
    error::{AvatarError, AvatarResult},
};

/// One premultiplied RGBA8 pixel.
pub type PremulPx = [u8; 4];

/// Premultiplied source-over: `src + dst * (1 - src_alpha)`.
pub fn over(dst: PremulPx, src: PremulPx) -> PremulPx {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let keep = 255 - u16::from(sa);
            std::array::from_fn(|i| src[i].saturating_add(scale255(dst[i], keep)))
        }
    }
}

/// Draw a full-frame premultiplied layer over `frame`.
pub fn over_in_place(frame: &mut FrameRGBA, layer: &[u8]) -> AvatarResult<()> {
    if frame.data.len() != layer.len() {
        return Err(AvatarError::export(format!(
            "layer has {} bytes, a {}x{} frame needs {}",
            layer.len(),
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }
    for (d, s) in frame.data.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn scale255(v: u8, f: u16) -> u8 {
    ((u32::from(v) * u32::from(f) + 127) / 255) as u8
}
