mod catalog;
mod dock;
mod lighting;
mod theme;

pub use catalog::ModelCatalog;
pub use dock::DockVisibility;
pub use lighting::{LightRig, LightingPreset};
pub use theme::ThemeMode;

use std::path::PathBuf;
use std::time::Instant;

/// Turntable rate around the vertical axis, radians per second.
pub const TURNTABLE_RATE: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("unknown model id: {0}")]
    UnknownModel(String),
    #[error("unknown animation: {0}")]
    UnknownAnimation(String),
}

/// Render-loop mode the shell requests from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frameloop {
    /// Redraw at display cadence.
    Continuous,
    /// Redraw only on interaction or explicit invalidation.
    OnDemand,
}

/// A model load the shell still has to dispatch. The generation tags the
/// renderer's eventual reply so superseded loads can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLoadRequest {
    pub model: String,
    pub path: PathBuf,
    pub generation: u64,
}

/// Everything the viewer shows, owned and mutated only by the controller.
#[derive(Debug, Clone)]
pub struct ViewerState {
    /// Always a member of the catalog.
    pub selected_model: String,
    /// Empty from a model change until that load reports back.
    pub available_animations: Vec<String>,
    /// `None` or a member of `available_animations`.
    pub selected_animation: Option<String>,
    pub is_playing: bool,
    pub turntable: bool,
    /// Camera drag in progress; suppresses the turntable.
    pub is_interacting: bool,
    pub lighting: LightingPreset,
    pub theme: ThemeMode,
    pub dock: DockVisibility,
}

/// Single source of truth for viewer state. Pure transitions: no I/O, no
/// clock reads (time comes in as arguments), no rendering types.
pub struct ViewerController {
    catalog: ModelCatalog,
    state: ViewerState,
    load_generation: u64,
    pending_load: Option<ModelLoadRequest>,
}

impl ViewerController {
    pub fn new(catalog: ModelCatalog, now: Instant) -> Self {
        let first = catalog.first().to_string();
        let mut controller = Self {
            state: ViewerState {
                selected_model: first.clone(),
                available_animations: Vec::new(),
                selected_animation: None,
                is_playing: true,
                turntable: false,
                is_interacting: false,
                lighting: LightingPreset::Studio,
                theme: ThemeMode::Light,
                dock: DockVisibility::new(now),
            },
            catalog,
            load_generation: 0,
            pending_load: None,
        };
        controller.queue_load(first);
        controller
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Generation of the newest requested load.
    pub fn generation(&self) -> u64 {
        self.load_generation
    }

    /// Hands the not-yet-dispatched load to the shell, if any. Only the
    /// newest request survives; superseded ones are never returned.
    pub fn take_pending_load(&mut self) -> Option<ModelLoadRequest> {
        self.pending_load.take()
    }

    pub fn select_model(&mut self, id: &str) -> Result<(), ViewerError> {
        if !self.catalog.contains(id) {
            return Err(ViewerError::UnknownModel(id.to_string()));
        }
        self.state.selected_model = id.to_string();
        self.state.available_animations.clear();
        self.state.selected_animation = None;
        self.state.is_playing = true;
        self.queue_load(id.to_string());
        Ok(())
    }

    /// One-shot reply from a model load with the clip names found in the
    /// asset, in asset order. Replies from superseded loads are dropped.
    pub fn animations_loaded(&mut self, generation: u64, names: Vec<String>) {
        if generation != self.load_generation {
            return;
        }
        self.state.available_animations = names;
        self.repair_selection();
    }

    /// One-shot failure reply. Leaves the viewer degraded but stable: no
    /// animations, no selection, model unchanged.
    pub fn load_failed(&mut self, generation: u64) {
        if generation != self.load_generation {
            return;
        }
        self.state.available_animations.clear();
        self.state.selected_animation = None;
    }

    pub fn select_animation(&mut self, name: &str) -> Result<(), ViewerError> {
        if !self.state.available_animations.iter().any(|n| n == name) {
            return Err(ViewerError::UnknownAnimation(name.to_string()));
        }
        self.state.selected_animation = Some(name.to_string());
        self.state.is_playing = true;
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.selected_animation.is_some() {
            self.state.is_playing = !self.state.is_playing;
        }
    }

    pub fn toggle_turntable(&mut self) {
        self.state.turntable = !self.state.turntable;
    }

    pub fn cycle_lighting(&mut self) {
        self.state.lighting = self.state.lighting.next();
    }

    pub fn toggle_theme(&mut self) {
        self.state.theme = self.state.theme.toggled();
    }

    pub fn notify_interaction_start(&mut self) {
        self.state.is_interacting = true;
    }

    pub fn notify_interaction_end(&mut self) {
        self.state.is_interacting = false;
    }

    pub fn notify_activity(&mut self, now: Instant) {
        self.state.dock.poke(now);
    }

    /// Evaluates the dock-hide countdown. Returns true when visibility
    /// flipped so the shell can repaint.
    pub fn tick_dock(&mut self, now: Instant) -> bool {
        self.state.dock.tick(now)
    }

    /// Clip the renderer should be playing right now.
    pub fn active_clip(&self) -> Option<&str> {
        if self.state.is_playing {
            self.state.selected_animation.as_deref()
        } else {
            None
        }
    }

    /// Yaw to add to the model root this frame. Evaluated every frame, not
    /// on state edges, since a camera drag can start and end between
    /// transitions.
    pub fn turntable_delta(&self, dt: f32) -> f32 {
        if self.state.turntable && !self.state.is_interacting {
            TURNTABLE_RATE * dt
        } else {
            0.0
        }
    }

    pub fn frameloop(&self) -> Frameloop {
        let animating = self.state.selected_animation.is_some() && self.state.is_playing;
        if animating || self.state.turntable {
            Frameloop::Continuous
        } else {
            Frameloop::OnDemand
        }
    }

    fn queue_load(&mut self, model: String) {
        self.load_generation += 1;
        let path = self.catalog.asset_path(&model);
        self.pending_load = Some(ModelLoadRequest {
            model,
            path,
            generation: self.load_generation,
        });
    }

    fn repair_selection(&mut self) {
        let still_valid = self
            .state
            .selected_animation
            .as_deref()
            .is_some_and(|sel| self.state.available_animations.iter().any(|n| n == sel));
        if !still_valid {
            self.state.selected_animation = self.state.available_animations.first().cloned();
        }
    }
}
