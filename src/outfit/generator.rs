use crate::{
    foundation::{
        core::{Category, LayerId},
        random::RandomSource,
    },
    outfit::{
        catalog::{Catalog, UnlockState},
        selection::AvatarSelection,
    },
};

/// Probability that a generated outfit wears a nose.
pub const NOSE_CHANCE: f64 = 0.9;
/// Probability that a generated outfit wears eyes.
pub const EYES_CHANCE: f64 = 0.9;

/// One tier of the accessory-count distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CountTier {
    /// Upper bound (exclusive) of the tier on the unit roll.
    pub below: f64,
    /// Smallest count in the tier.
    pub min: usize,
    /// Number of equally likely counts starting at `min`.
    pub span: usize,
}

/// `{0,1}` 60%, `{2,3}` 28%, `{4..7}` 12%.
pub const ACCESSORY_TIERS: [CountTier; 3] = [
    CountTier {
        below: 0.60,
        min: 0,
        span: 2,
    },
    CountTier {
        below: 0.88,
        min: 2,
        span: 2,
    },
    CountTier {
        below: 1.0,
        min: 4,
        span: 4,
    },
];

/// Builds random but always valid outfits from a catalog.
#[derive(Clone, Copy, Debug)]
pub struct RandomOutfitGenerator<'a> {
    catalog: &'a Catalog,
}

impl<'a> RandomOutfitGenerator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Draw a full outfit. Lucky variants are eligible only when `unlock` is unlocked.
    pub fn generate(&self, unlock: &UnlockState, rng: &mut impl RandomSource) -> AvatarSelection {
        let accessories = self.catalog.visible(Category::Accessory);
        let count = accessory_count(rng).min(accessories.len());

        let bases = self.catalog.options(Category::Base, unlock);
        let noses = self.catalog.options(Category::Nose, unlock);
        let eyes = self.catalog.options(Category::Eyes, unlock);

        let base = pick_one(&bases, rng)
            .cloned()
            .unwrap_or_else(|| self.catalog.default_base().clone());
        let nose = if rng.chance(NOSE_CHANCE) {
            pick_one(&noses, rng).cloned()
        } else {
            None
        };
        let eyes = if rng.chance(EYES_CHANCE) {
            pick_one(&eyes, rng).cloned()
        } else {
            None
        };

        let picked = sample_without_replacement(accessories, count, rng);
        tracing::debug!(
            base = %base,
            nose = ?nose.as_ref().map(LayerId::as_str),
            eyes = ?eyes.as_ref().map(LayerId::as_str),
            accessories = picked.len(),
            "generated outfit"
        );

        AvatarSelection::new(base)
            .with_nose(nose)
            .with_eyes(eyes)
            .with_accessories(picked)
    }
}

/// Draw an accessory count from [`ACCESSORY_TIERS`]: one roll picks the tier, a second picks
/// uniformly inside it.
pub fn accessory_count(rng: &mut impl RandomSource) -> usize {
    let roll = rng.next_unit();
    let tier = ACCESSORY_TIERS
        .iter()
        .find(|t| roll < t.below)
        .unwrap_or(&ACCESSORY_TIERS[ACCESSORY_TIERS.len() - 1]);
    tier.min + rng.pick_index(tier.span)
}

fn pick_one<'p, T>(pool: &'p [T], rng: &mut impl RandomSource) -> Option<&'p T> {
    if pool.is_empty() {
        return None;
    }
    Some(&pool[rng.pick_index(pool.len())])
}

/// Uniform sample of `count` distinct items, in draw order.
pub fn sample_without_replacement<T: Clone>(
    pool: &[T],
    count: usize,
    rng: &mut impl RandomSource,
) -> Vec<T> {
    let mut remaining: Vec<&T> = pool.iter().collect();
    let mut out = Vec::with_capacity(count.min(pool.len()));
    while !remaining.is_empty() && out.len() < count {
        let idx = rng.pick_index(remaining.len());
        out.push(remaining.swap_remove(idx).clone());
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/outfit/generator.rs"]
mod tests;
