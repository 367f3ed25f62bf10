use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image, unpremultiply_rgba8_in_place},
        provider::AssetProvider,
    },
    foundation::{
        core::{EXPORT_FILE_NAME, EXPORT_SIZE, FrameRGBA},
        error::{AvatarError, AvatarResult},
    },
    outfit::selection::AvatarSelection,
    render::composite::over_in_place,
};

/// Flattens a selection into one square raster of [`EXPORT_SIZE`] pixels.
///
/// Layers are drawn bottom to top (base, nose, eyes, accessories in insertion order), each
/// stretched to the full canvas. Autoframing is a thumbnail concern and is not applied here.
pub struct LayerCompositor {
    provider: Arc<dyn AssetProvider>,
    size: u32,
}

impl LayerCompositor {
    pub fn new(provider: Arc<dyn AssetProvider>) -> Self {
        Self {
            provider,
            size: EXPORT_SIZE,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Render the composite as premultiplied RGBA8.
    ///
    /// All layers are loaded and decoded before anything is drawn; the first failure aborts the
    /// render.
    #[tracing::instrument(skip(self, selection), fields(layers = selection.layers().len()))]
    pub fn render(&self, selection: &AvatarSelection) -> AvatarResult<FrameRGBA> {
        let layers = selection.layers();
        let decoded = layers
            .par_iter()
            .map(|(category, id)| {
                let bytes = self.provider.load(*category, id)?;
                decode_image(&bytes)
            })
            .collect::<AvatarResult<Vec<PreparedImage>>>()?;

        let size = self.size;
        let mut frame = FrameRGBA::transparent(size, size);
        for img in &decoded {
            let stretched = stretch_to(img, size, size)?;
            over_in_place(&mut frame, &stretched)?;
        }
        Ok(frame)
    }

    /// Render and write `dir/build-a-bubu.png`, returning the written path.
    ///
    /// The PNG is written to a temporary sibling and renamed into place, so a failure leaves no
    /// file at the destination.
    #[tracing::instrument(skip(self, selection))]
    pub fn export_png(&self, selection: &AvatarSelection, dir: &Path) -> AvatarResult<PathBuf> {
        let frame = self.render(selection)?;
        let png = encode_png(&frame)?;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        let out = dir.join(EXPORT_FILE_NAME);
        let partial = dir.join(format!(".{EXPORT_FILE_NAME}.partial"));

        if let Err(err) = std::fs::write(&partial, &png) {
            std::fs::remove_file(&partial).ok();
            return Err(AvatarError::export(format!(
                "write '{}': {err}",
                partial.display()
            )));
        }
        if let Err(err) = std::fs::rename(&partial, &out) {
            std::fs::remove_file(&partial).ok();
            return Err(AvatarError::export(format!(
                "move into '{}': {err}",
                out.display()
            )));
        }

        tracing::debug!(path = %out.display(), bytes = png.len(), "exported composite");
        Ok(out)
    }
}

/// Resample a decoded image to `width x height`, premultiplied RGBA8.
pub(crate) fn stretch_to(img: &PreparedImage, width: u32, height: u32) -> AvatarResult<Vec<u8>> {
    if img.width == width && img.height == height {
        return Ok(img.rgba8_premul.as_ref().clone());
    }
    let src = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.to_vec())
        .ok_or_else(|| AvatarError::decode("decoded buffer does not match its dimensions"))?;
    let resized =
        image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
    Ok(resized.into_raw())
}

/// Encode a frame as PNG bytes (straight alpha, no metadata chunks).
pub fn encode_png(frame: &FrameRGBA) -> AvatarResult<Vec<u8>> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| AvatarError::encode("frame buffer does not match its dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| AvatarError::encode(format!("png: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
