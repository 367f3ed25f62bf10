use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image},
        provider::AssetProvider,
    },
    autoframe::focus::AlphaFocus,
    foundation::{
        config::{AutoframeOpts, NoseBoost},
        core::{Category, LayerId},
        error::AvatarResult,
    },
};

/// Memoized focus results keyed by resource key.
///
/// Entries are never evicted; the catalog is static and small. The first value stored for a key
/// wins, so concurrent first-time resolutions converge on one entry.
#[derive(Debug, Default)]
pub struct FocusCache {
    entries: Mutex<HashMap<String, AlphaFocus>>,
}

impl FocusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<AlphaFocus> {
        self.lock().get(key).copied()
    }

    /// Store `focus` unless the key is already present; returns the stored value.
    pub fn insert(&self, key: String, focus: AlphaFocus) -> AlphaFocus {
        *self.lock().entry(key).or_insert(focus)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AlphaFocus>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Inclusive pixel bounds of the sampled visible content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlphaBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Bounding box of every sampled pixel whose alpha exceeds `threshold`.
///
/// Only every `stride`-th pixel on each axis is inspected, so thin features can be missed and the
/// box can be up to `stride - 1` pixels short on each side.
pub fn alpha_bounds(img: &PreparedImage, stride: u32, threshold: u8) -> Option<AlphaBounds> {
    let stride = stride.max(1) as usize;
    let mut bounds: Option<AlphaBounds> = None;
    for y in (0..img.height).step_by(stride) {
        for x in (0..img.width).step_by(stride) {
            if img.alpha_at(x, y) <= threshold {
                continue;
            }
            let b = bounds.get_or_insert(AlphaBounds {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            });
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
    }
    bounds
}

/// Compute the focus of a decoded image, or `None` when no pixel clears the threshold.
pub fn measure_focus(img: &PreparedImage, opts: &AutoframeOpts) -> Option<AlphaFocus> {
    let b = alpha_bounds(img, opts.stride, opts.alpha_threshold)?;
    let (w, h) = (f64::from(img.width), f64::from(img.height));

    let cx = f64::from(b.min_x + b.max_x) / 2.0;
    let cy = f64::from(b.min_y + b.max_y) / 2.0;
    let bw = f64::from((b.max_x - b.min_x).max(1));
    let bh = f64::from((b.max_y - b.min_y).max(1));

    // Fit the tighter axis so neither overshoots.
    let sx = opts.target_fill / (bw / w);
    let sy = opts.target_fill / (bh / h);
    let scale = sx.min(sy).clamp(opts.min_scale, opts.max_scale);

    Some(AlphaFocus {
        center_x: cx / w,
        center_y: cy / h,
        scale,
    })
}

/// Resolves and memoizes [`AlphaFocus`] values for catalog artwork.
pub struct AlphaFocusResolver {
    provider: Arc<dyn AssetProvider>,
    cache: Arc<FocusCache>,
    opts: AutoframeOpts,
    nose_boost: NoseBoost,
    scans: AtomicU64,
}

impl AlphaFocusResolver {
    pub fn new(provider: Arc<dyn AssetProvider>, opts: AutoframeOpts) -> Self {
        Self::with_cache(provider, Arc::new(FocusCache::new()), opts)
    }

    /// Resolver backed by an existing, possibly shared, cache.
    pub fn with_cache(
        provider: Arc<dyn AssetProvider>,
        cache: Arc<FocusCache>,
        opts: AutoframeOpts,
    ) -> Self {
        Self {
            provider,
            cache,
            opts,
            nose_boost: NoseBoost::default(),
            scans: AtomicU64::new(0),
        }
    }

    pub fn with_nose_boost(mut self, nose_boost: NoseBoost) -> Self {
        self.nose_boost = nose_boost;
        self
    }

    pub fn cache(&self) -> &Arc<FocusCache> {
        &self.cache
    }

    /// Number of decode-and-scan passes performed by this resolver.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Resolve a focus, surfacing load and decode errors.
    ///
    /// Fully transparent artwork is not an error: it yields and caches the fallback focus.
    /// Failures are not cached, so a later call retries.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn try_resolve(&self, category: Category, id: &LayerId) -> AvatarResult<AlphaFocus> {
        let key = self.provider.resource_key(category, id);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "focus cache hit");
            return Ok(hit);
        }

        let bytes = self.provider.load(category, id)?;
        let img = decode_image(&bytes)?;
        self.scans.fetch_add(1, Ordering::Relaxed);

        let focus = measure_focus(&img, &self.opts).unwrap_or_else(|| {
            tracing::debug!(%key, "no visible pixels, using fallback focus");
            AlphaFocus::fallback(&self.opts)
        });
        Ok(self.cache.insert(key, focus))
    }

    /// Resolve a focus, degrading to the centered fallback on any failure.
    pub fn resolve(&self, category: Category, id: &LayerId) -> AlphaFocus {
        self.try_resolve(category, id).unwrap_or_else(|err| {
            tracing::warn!(%category, %id, %err, "autoframing failed, using fallback focus");
            AlphaFocus::fallback(&self.opts)
        })
    }

    /// Focus as a thumbnail should use it, with the category adjustment applied.
    ///
    /// Unreadable nose artwork falls back to the larger nose default instead of a boosted
    /// generic fallback.
    pub fn thumbnail_focus(&self, category: Category, id: &LayerId) -> AlphaFocus {
        match self.try_resolve(category, id) {
            Ok(focus) => focus.for_category(category, &self.nose_boost),
            Err(err) => {
                tracing::warn!(%category, %id, %err, "thumbnail autoframing failed");
                match category {
                    Category::Nose => AlphaFocus::centered(self.nose_boost.fallback_scale),
                    _ => AlphaFocus::fallback(&self.opts),
                }
            }
        }
    }

    /// Thumbnail focus for a batch of layers, resolved in parallel. Output order matches input.
    pub fn resolve_many(&self, layers: &[(Category, LayerId)]) -> Vec<AlphaFocus> {
        layers
            .par_iter()
            .map(|(category, id)| self.thumbnail_focus(*category, id))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/autoframe/resolver.rs"]
mod tests;
