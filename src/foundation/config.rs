use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::foundation::error::{AvatarError, AvatarResult};

/// Alpha-bounding-box autoframing parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AutoframeOpts {
    /// Sample every `stride`-th pixel on both axes.
    pub stride: u32,
    /// Alpha must be strictly greater than this to count as visible content.
    pub alpha_threshold: u8,
    /// Fraction of the canvas the content bounding box should fill.
    pub target_fill: f64,
    /// Lower clamp for the computed scale.
    pub min_scale: f64,
    /// Upper clamp for the computed scale.
    pub max_scale: f64,
    /// Scale used when nothing visible is found or the artwork is unreadable.
    pub fallback_scale: f64,
}

impl Default for AutoframeOpts {
    fn default() -> Self {
        Self {
            stride: 3,
            alpha_threshold: 8,
            target_fill: 0.78,
            min_scale: 1.05,
            max_scale: 3.2,
            fallback_scale: 1.5,
        }
    }
}

/// Post-adjustment applied to nose thumbnails, whose artwork is tiny relative to its canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NoseBoost {
    pub factor: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale used when nose artwork cannot be decoded.
    pub fallback_scale: f64,
}

impl Default for NoseBoost {
    fn default() -> Self {
        Self {
            factor: 1.85,
            min_scale: 1.4,
            max_scale: 4.8,
            fallback_scale: 2.9,
        }
    }
}

/// Offsets of the blind-box phases, in milliseconds.
///
/// `calibrate_ms` through `lose_close_ms` are relative to `start`; `settle_ms` is relative to
/// `close`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RevealTimings {
    pub calibrate_ms: u64,
    pub open_ms: u64,
    pub reveal_ms: u64,
    pub unlock_ms: u64,
    pub win_close_ms: u64,
    pub lose_close_ms: u64,
    pub settle_ms: u64,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            calibrate_ms: 850,
            open_ms: 3600,
            reveal_ms: 3800,
            unlock_ms: 3950,
            win_close_ms: 8200,
            lose_close_ms: 7800,
            settle_ms: 260,
        }
    }
}

impl RevealTimings {
    pub fn validate(&self) -> AvatarResult<()> {
        let ordered = self.calibrate_ms <= self.open_ms
            && self.open_ms <= self.reveal_ms
            && self.reveal_ms <= self.unlock_ms
            && self.unlock_ms <= self.win_close_ms
            && self.reveal_ms <= self.lose_close_ms;
        if !ordered {
            return Err(AvatarError::validation(
                "reveal timings must be non-decreasing: calibrate <= open <= reveal <= unlock <= win_close, reveal <= lose_close",
            ));
        }
        Ok(())
    }

    pub(crate) fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }
}

/// Top-level configuration for an [`AvatarStudio`](crate::AvatarStudio).
///
/// The export canvas is fixed at [`EXPORT_SIZE`](crate::EXPORT_SIZE) and always written as
/// [`EXPORT_FILE_NAME`](crate::EXPORT_FILE_NAME); unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Directory holding `base/`, `nose/`, `eyes/` and `acc/`.
    pub assets_root: PathBuf,
    pub autoframe: AutoframeOpts,
    pub nose_boost: NoseBoost,
    pub reveal: RevealTimings,
    /// Probability of a winning reveal when no outcome is forced.
    pub win_chance: f64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            autoframe: AutoframeOpts::default(),
            nose_boost: NoseBoost::default(),
            reveal: RevealTimings::default(),
            win_chance: 0.02,
        }
    }
}

impl StudioConfig {
    /// Load a JSON config. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> AvatarResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: StudioConfig = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AvatarResult<()> {
        if self.autoframe.stride == 0 {
            return Err(AvatarError::validation("autoframe stride must be > 0"));
        }
        if !(self.autoframe.target_fill > 0.0 && self.autoframe.target_fill <= 1.0) {
            return Err(AvatarError::validation(
                "autoframe target_fill must be in (0, 1]",
            ));
        }
        if self.autoframe.min_scale > self.autoframe.max_scale
            || self.nose_boost.min_scale > self.nose_boost.max_scale
        {
            return Err(AvatarError::validation("min_scale must be <= max_scale"));
        }
        if !(0.0..=1.0).contains(&self.win_chance) {
            return Err(AvatarError::validation("win_chance must be in [0, 1]"));
        }
        self.reveal.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
