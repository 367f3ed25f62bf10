//! Build-a-Bubu is a layered avatar builder.
//!
//! An avatar is a stack of PNG layers (base, nose, eyes, accessories). The crate provides:
//!
//! - A catalog with hidden "lucky" variants and a random outfit generator
//! - Alpha-bounding-box autoframing for option thumbnails
//! - A timer-driven blind-box reveal that can unlock the lucky variants
//! - Compositing and PNG export of the current outfit
//!
//! [`AvatarStudio`] ties these together into one session.
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod autoframe;
pub(crate) mod outfit;
pub(crate) mod render;
pub(crate) mod reveal;
/// Session controller.
pub mod studio;

pub use crate::foundation::config::{AutoframeOpts, NoseBoost, RevealTimings, StudioConfig};
pub use crate::foundation::core::{Category, EXPORT_FILE_NAME, EXPORT_SIZE, FrameRGBA, LayerId};
pub use crate::foundation::error::{AvatarError, AvatarResult};
pub use crate::foundation::random::{RandomSource, ScriptedRandom, StdRandom};

pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::provider::{AssetProvider, FsAssetProvider, MemoryAssetProvider};

pub use crate::autoframe::focus::{AlphaFocus, ThumbTransform};
pub use crate::autoframe::resolver::{
    AlphaBounds, AlphaFocusResolver, FocusCache, alpha_bounds, measure_focus,
};

pub use crate::outfit::catalog::{Catalog, UnlockState};
pub use crate::outfit::generator::RandomOutfitGenerator;
pub use crate::outfit::selection::AvatarSelection;

pub use crate::render::composite::{over, over_in_place};
pub use crate::render::compositor::{LayerCompositor, encode_png};
pub use crate::render::thumbnail::{contact_sheet, render_thumbnail};

pub use crate::reveal::machine::{PhaseChange, RevealEffect, RevealMachine, RevealSession, RevealView};
pub use crate::reveal::phase::{Outcome, RevealPhase, Transition};
pub use crate::reveal::scheduler::{
    Fired, ManualScheduler, RevealEvent, Scheduler, SystemScheduler, TimerId, TimerQueue,
};

pub use crate::studio::{AvatarStudio, Notice};
