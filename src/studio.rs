use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::provider::{AssetProvider, FsAssetProvider},
    autoframe::{focus::AlphaFocus, resolver::AlphaFocusResolver},
    foundation::{
        config::StudioConfig,
        core::{Category, FrameRGBA, LayerId},
        error::{AvatarError, AvatarResult},
        random::{RandomSource, StdRandom},
    },
    outfit::{
        catalog::{Catalog, UnlockState},
        generator::RandomOutfitGenerator,
        selection::AvatarSelection,
    },
    render::compositor::LayerCompositor,
    reveal::{
        machine::{RevealEffect, RevealMachine, RevealView},
        scheduler::{Scheduler, SystemScheduler},
    },
};

/// Transient user-facing message about the last export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Downloaded(PathBuf),
    DownloadFailed(String),
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::Downloaded(_) => "DOWNLOADED",
            Notice::DownloadFailed(_) => "DOWNLOAD FAILED",
        }
    }
}

/// Session controller: owns the outfit, the unlock flag and the blind box.
///
/// `S` drives reveal timers; `R` is the single random source shared by outfit generation and
/// the reveal draw.
pub struct AvatarStudio<S, R> {
    config: StudioConfig,
    catalog: Catalog,
    unlock: UnlockState,
    selection: AvatarSelection,
    reveal: RevealMachine<S, R>,
    resolver: AlphaFocusResolver,
    compositor: LayerCompositor,
    notice: Option<Notice>,
}

impl AvatarStudio<SystemScheduler, StdRandom> {
    /// Filesystem-backed studio running on the wall clock.
    pub fn from_config(config: StudioConfig) -> AvatarResult<Self> {
        let provider = Arc::new(FsAssetProvider::new(config.assets_root.clone()));
        Self::new(config, provider, SystemScheduler::new(), StdRandom::from_os_rng())
    }
}

impl<S: Scheduler, R: RandomSource> AvatarStudio<S, R> {
    pub fn new(
        config: StudioConfig,
        provider: Arc<dyn AssetProvider>,
        scheduler: S,
        rng: R,
    ) -> AvatarResult<Self> {
        config.validate()?;
        let catalog = Catalog::standard();
        let resolver = AlphaFocusResolver::new(provider.clone(), config.autoframe)
            .with_nose_boost(config.nose_boost);
        let compositor = LayerCompositor::new(provider);
        let reveal = RevealMachine::new(scheduler, rng, config.reveal, config.win_chance);

        Ok(Self {
            selection: AvatarSelection::fresh(&catalog),
            catalog,
            unlock: UnlockState::locked(),
            reveal,
            resolver,
            compositor,
            notice: None,
            config,
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &AvatarSelection {
        &self.selection
    }

    pub fn unlock_state(&self) -> &UnlockState {
        &self.unlock
    }

    pub fn resolver(&self) -> &AlphaFocusResolver {
        &self.resolver
    }

    pub fn reveal(&self) -> &RevealMachine<S, R> {
        &self.reveal
    }

    pub fn reveal_mut(&mut self) -> &mut RevealMachine<S, R> {
        &mut self.reveal
    }

    /// Currently selectable options of a category.
    pub fn options(&self, category: Category) -> Vec<LayerId> {
        self.catalog.options(category, &self.unlock)
    }

    fn ensure_available(&self, category: Category, id: &LayerId) -> AvatarResult<()> {
        if self.catalog.contains(category, id, &self.unlock) {
            Ok(())
        } else {
            Err(AvatarError::validation(format!(
                "{category} '{id}' is not an available option"
            )))
        }
    }

    pub fn set_base(&mut self, id: LayerId) -> AvatarResult<()> {
        self.ensure_available(Category::Base, &id)?;
        self.selection.set_base(id);
        Ok(())
    }

    pub fn set_nose(&mut self, id: Option<LayerId>) -> AvatarResult<()> {
        if let Some(id) = &id {
            self.ensure_available(Category::Nose, id)?;
        }
        self.selection.set_nose(id);
        Ok(())
    }

    pub fn set_eyes(&mut self, id: Option<LayerId>) -> AvatarResult<()> {
        if let Some(id) = &id {
            self.ensure_available(Category::Eyes, id)?;
        }
        self.selection.set_eyes(id);
        Ok(())
    }

    /// Add or remove an accessory. Returns whether it is worn afterwards.
    pub fn toggle_accessory(&mut self, id: LayerId) -> AvatarResult<bool> {
        self.ensure_available(Category::Accessory, &id)?;
        Ok(self.selection.toggle_accessory(id))
    }

    pub fn clear_nose(&mut self) {
        self.selection.set_nose(None);
    }

    pub fn clear_eyes(&mut self) {
        self.selection.set_eyes(None);
    }

    pub fn clear_accessories(&mut self) {
        self.selection.clear_accessories();
    }

    /// Reset the outfit. The unlock flag is not part of the outfit and survives.
    pub fn clear_all(&mut self) {
        self.selection = AvatarSelection::fresh(&self.catalog);
    }

    /// Replace the outfit with a random one.
    pub fn build_for_me(&mut self) -> &AvatarSelection {
        let generator = RandomOutfitGenerator::new(&self.catalog);
        self.selection = generator.generate(&self.unlock, self.reveal.rng_mut());
        &self.selection
    }

    /// Autoframed focus for one option tile.
    pub fn thumbnail_focus(&self, category: Category, id: &LayerId) -> AlphaFocus {
        self.resolver.thumbnail_focus(category, id)
    }

    /// Autoframed focus for every current option of a category.
    pub fn thumbnails(&self, category: Category) -> Vec<(LayerId, AlphaFocus)> {
        let layers: Vec<(Category, LayerId)> = self
            .options(category)
            .into_iter()
            .map(|id| (category, id))
            .collect();
        let foci = self.resolver.resolve_many(&layers);
        layers.into_iter().map(|(_, id)| id).zip(foci).collect()
    }

    /// Composite of the current outfit.
    pub fn render(&self) -> AvatarResult<FrameRGBA> {
        self.compositor.render(&self.selection)
    }

    /// Export the current outfit into `dir` and post a notice either way.
    pub fn export_to(&mut self, dir: &Path) -> AvatarResult<PathBuf> {
        match self.compositor.export_png(&self.selection, dir) {
            Ok(path) => {
                self.notice = Some(Notice::Downloaded(path.clone()));
                Ok(path)
            }
            Err(err) => {
                tracing::warn!(%err, "export failed");
                self.notice = Some(Notice::DownloadFailed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Read and clear the pending notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Open the blind box. Returns `false` while a reveal is already running.
    pub fn start_reveal(&mut self, force_outcome: Option<bool>) -> bool {
        self.reveal.start(force_outcome)
    }

    pub fn close_reveal(&mut self) {
        self.reveal.close();
    }

    pub fn reveal_view(&self) -> RevealView {
        self.reveal.view()
    }

    /// Fire due reveal timers and apply their effects.
    pub fn pump(&mut self) -> Vec<RevealEffect> {
        let effects = self.reveal.pump();
        for effect in &effects {
            match effect {
                RevealEffect::UnlockLucky => self.apply_lucky_unlock(),
            }
        }
        effects
    }

    fn apply_lucky_unlock(&mut self) {
        if self.unlock.unlock() {
            tracing::info!("lucky variants unlocked");
        }
        if let Some(base) = self.catalog.lucky(Category::Base) {
            self.selection.set_base(base.clone());
        }
        if let Some(nose) = self.catalog.lucky(Category::Nose) {
            self.selection.set_nose(Some(nose.clone()));
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/studio.rs"]
mod tests;
