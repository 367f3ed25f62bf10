use std::collections::HashSet;

use crate::{
    foundation::{
        core::{Category, LayerId},
        error::{AvatarError, AvatarResult},
    },
    outfit::catalog::{Catalog, UnlockState},
};

/// The current outfit.
///
/// `base` is always set. Accessories keep insertion order, which is also their composite
/// z-order, and never contain duplicates.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AvatarSelection {
    base: LayerId,
    nose: Option<LayerId>,
    eyes: Option<LayerId>,
    accessories: Vec<LayerId>,
}

impl AvatarSelection {
    /// Outfit with only a base.
    pub fn new(base: LayerId) -> Self {
        Self {
            base,
            nose: None,
            eyes: None,
            accessories: Vec::new(),
        }
    }

    /// Fresh outfit: the catalog's default base and nothing else.
    pub fn fresh(catalog: &Catalog) -> Self {
        Self::new(catalog.default_base().clone())
    }

    pub fn with_nose(mut self, nose: Option<LayerId>) -> Self {
        self.nose = nose;
        self
    }

    pub fn with_eyes(mut self, eyes: Option<LayerId>) -> Self {
        self.eyes = eyes;
        self
    }

    /// Append accessories, skipping any already present.
    pub fn with_accessories(mut self, ids: impl IntoIterator<Item = LayerId>) -> Self {
        for id in ids {
            if !self.accessories.contains(&id) {
                self.accessories.push(id);
            }
        }
        self
    }

    pub fn base(&self) -> &LayerId {
        &self.base
    }

    pub fn nose(&self) -> Option<&LayerId> {
        self.nose.as_ref()
    }

    pub fn eyes(&self) -> Option<&LayerId> {
        self.eyes.as_ref()
    }

    pub fn accessories(&self) -> &[LayerId] {
        &self.accessories
    }

    pub(crate) fn set_base(&mut self, id: LayerId) {
        self.base = id;
    }

    pub(crate) fn set_nose(&mut self, id: Option<LayerId>) {
        self.nose = id;
    }

    pub(crate) fn set_eyes(&mut self, id: Option<LayerId>) {
        self.eyes = id;
    }

    /// Add the accessory if absent, remove it if present. Returns whether it is now worn.
    pub(crate) fn toggle_accessory(&mut self, id: LayerId) -> bool {
        if let Some(pos) = self.accessories.iter().position(|a| *a == id) {
            self.accessories.remove(pos);
            false
        } else {
            self.accessories.push(id);
            true
        }
    }

    pub(crate) fn clear_accessories(&mut self) {
        self.accessories.clear();
    }

    /// Layers in composite z-order, bottom to top.
    pub fn layers(&self) -> Vec<(Category, &LayerId)> {
        let mut out = Vec::with_capacity(3 + self.accessories.len());
        out.push((Category::Base, &self.base));
        if let Some(n) = &self.nose {
            out.push((Category::Nose, n));
        }
        if let Some(e) = &self.eyes {
            out.push((Category::Eyes, e));
        }
        out.extend(self.accessories.iter().map(|a| (Category::Accessory, a)));
        out
    }

    /// Check every referenced id against the currently unlocked pools.
    pub fn validate(&self, catalog: &Catalog, unlock: &UnlockState) -> AvatarResult<()> {
        let mut seen = HashSet::new();
        for (category, id) in self.layers() {
            if !catalog.contains(category, id, unlock) {
                return Err(AvatarError::validation(format!(
                    "{category} '{id}' is not an available option"
                )));
            }
            if category == Category::Accessory && !seen.insert(id) {
                return Err(AvatarError::validation(format!(
                    "accessory '{id}' appears more than once"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/outfit/selection.rs"]
mod tests;
