use kurbo::{Affine, Vec2};

use crate::foundation::{
    config::{AutoframeOpts, NoseBoost},
    core::Category,
};

/// Where an image's opaque content sits and how much to enlarge it.
///
/// `center_x`/`center_y` are fractions of the image size; `scale` is the magnification that makes
/// the content bounding box fill the target fraction of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlphaFocus {
    pub center_x: f64,
    pub center_y: f64,
    pub scale: f64,
}

impl AlphaFocus {
    /// Centered focus at the given scale, used whenever nothing can be measured.
    pub fn centered(scale: f64) -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            scale,
        }
    }

    /// Degraded default for unreadable or fully transparent artwork.
    pub fn fallback(opts: &AutoframeOpts) -> Self {
        Self::centered(opts.fallback_scale)
    }

    /// Category-specific post-adjustment for thumbnails.
    ///
    /// Nose artwork is tiny on its canvas, so its scale is amplified and re-clamped. Other
    /// categories pass through.
    pub fn for_category(self, category: Category, boost: &NoseBoost) -> Self {
        match category {
            Category::Nose => Self {
                scale: (self.scale * boost.factor).clamp(boost.min_scale, boost.max_scale),
                ..self
            },
            _ => self,
        }
    }

    /// Thumbnail transform that moves the content center to the tile center.
    pub fn transform(&self) -> ThumbTransform {
        ThumbTransform {
            translate_x_pct: 50.0 - self.scale * self.center_x * 100.0,
            translate_y_pct: 50.0 - self.scale * self.center_y * 100.0,
            scale: self.scale,
        }
    }
}

/// Translate-then-scale with the origin pinned at the image's top-left corner.
///
/// Translations are percentages of the tile size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThumbTransform {
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
    pub scale: f64,
}

impl ThumbTransform {
    /// CSS `transform` value; pair with `transform-origin: 0 0`.
    pub fn to_css(&self) -> String {
        format!(
            "translate({}%, {}%) scale({})",
            self.translate_x_pct, self.translate_y_pct, self.scale
        )
    }

    /// Affine mapping tile-space points of the unscaled image to their displayed position.
    pub fn to_affine(&self, tile_width: f64, tile_height: f64) -> Affine {
        let offset = Vec2::new(
            self.translate_x_pct / 100.0 * tile_width,
            self.translate_y_pct / 100.0 * tile_height,
        );
        Affine::translate(offset) * Affine::scale(self.scale)
    }
}
