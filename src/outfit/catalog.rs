use crate::foundation::core::{Category, LayerId};

/// Process-scoped unlock flag. Only ever moves from locked to unlocked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnlockState {
    lucky_unlocked: bool,
}

impl UnlockState {
    pub fn locked() -> Self {
        Self::default()
    }

    pub fn unlocked() -> Self {
        Self {
            lucky_unlocked: true,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.lucky_unlocked
    }

    /// Unlock the lucky variants. Returns `true` if this call changed the state.
    pub fn unlock(&mut self) -> bool {
        let changed = !self.lucky_unlocked;
        self.lucky_unlocked = true;
        changed
    }
}

/// Fixed option pools for every category.
///
/// Base and nose each carry one hidden lucky variant that only appears in their pools once
/// [`UnlockState`] is unlocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    base: Vec<LayerId>,
    base_lucky: LayerId,
    nose: Vec<LayerId>,
    nose_lucky: LayerId,
    eyes: Vec<LayerId>,
    accessories: Vec<LayerId>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn numbered(prefix: &str, count: u32) -> Vec<LayerId> {
    (1..=count).map(|n| LayerId::numbered(prefix, n)).collect()
}

impl Catalog {
    /// 6+1 bases, 6+1 noses, 4 eyes, 22 accessories.
    pub fn standard() -> Self {
        Self {
            base: numbered("base", 6),
            base_lucky: LayerId::numbered("base", 7),
            nose: numbered("nose", 6),
            nose_lucky: LayerId::numbered("nose", 7),
            eyes: numbered("eyes", 4),
            accessories: numbered("acc", 22),
        }
    }

    /// The visible pool of a category, ignoring lucky variants.
    pub fn visible(&self, category: Category) -> &[LayerId] {
        match category {
            Category::Base => &self.base,
            Category::Nose => &self.nose,
            Category::Eyes => &self.eyes,
            Category::Accessory => &self.accessories,
        }
    }

    /// Lucky variant of a category, if it has one.
    pub fn lucky(&self, category: Category) -> Option<&LayerId> {
        match category {
            Category::Base => Some(&self.base_lucky),
            Category::Nose => Some(&self.nose_lucky),
            Category::Eyes | Category::Accessory => None,
        }
    }

    /// Currently selectable options, in display order.
    pub fn options(&self, category: Category, unlock: &UnlockState) -> Vec<LayerId> {
        let mut ids = self.visible(category).to_vec();
        if unlock.is_unlocked()
            && let Some(lucky) = self.lucky(category)
        {
            ids.push(lucky.clone());
        }
        ids
    }

    pub fn contains(&self, category: Category, id: &LayerId, unlock: &UnlockState) -> bool {
        self.visible(category).contains(id)
            || (unlock.is_unlocked() && self.lucky(category) == Some(id))
    }

    /// Base every fresh outfit starts from.
    pub fn default_base(&self) -> &LayerId {
        &self.base[0]
    }
}
