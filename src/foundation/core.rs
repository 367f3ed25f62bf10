use std::fmt;

use crate::foundation::error::{AvatarError, AvatarResult};

/// Side length of the exported composite, in pixels.
pub const EXPORT_SIZE: u32 = 2048;

/// File name used for exported composites.
pub const EXPORT_FILE_NAME: &str = "build-a-bubu.png";

/// Selectable layer category.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Body base, always present.
    Base,
    /// Optional nose layer.
    Nose,
    /// Optional eyes layer.
    Eyes,
    /// Zero or more accessories.
    Accessory,
}

impl Category {
    /// All categories in composite z-order, bottom to top.
    pub const ALL: [Category; 4] = [
        Category::Base,
        Category::Nose,
        Category::Eyes,
        Category::Accessory,
    ];

    /// Directory the category's artwork lives in.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Base => "base",
            Category::Nose => "nose",
            Category::Eyes => "eyes",
            Category::Accessory => "acc",
        }
    }

    /// Human-facing section label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Base => "Base",
            Category::Nose => "Nose",
            Category::Eyes => "Eyes",
            Category::Accessory => "Accessories",
        }
    }

    /// Parse a category from its directory name or its full name.
    pub fn parse(s: &str) -> AvatarResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(Category::Base),
            "nose" => Ok(Category::Nose),
            "eyes" => Ok(Category::Eyes),
            "acc" | "accessory" | "accessories" => Ok(Category::Accessory),
            other => Err(AvatarError::validation(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Opaque key of one selectable image asset within a category.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Wrap an identifier. Empty identifiers are rejected.
    pub fn new(id: impl Into<String>) -> AvatarResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AvatarError::validation("layer id must be non-empty"));
        }
        Ok(Self(id))
    }

    /// Catalog-style id with a two-digit suffix, e.g. `base-01`.
    pub fn numbered(prefix: &str, n: u32) -> Self {
        Self(format!("{prefix}-{n:02}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A rendered raster surface as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied surface.
    pub fn transparent(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        Self {
            width,
            height,
            data: vec![0u8; len],
            premultiplied: true,
        }
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}
