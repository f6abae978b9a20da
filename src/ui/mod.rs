use crate::viewer::{ModelCatalog, ViewerState};

/// Below this window width the dock docks to the bottom edge instead of
/// the upper-left corner.
pub const COMPACT_BREAKPOINT: f32 = 600.0;

/// One user action collected from the dock. The app applies intents to the
/// controller after the UI pass; the dock itself never mutates state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlIntent {
    SelectModel(String),
    SelectAnimation(String),
    TogglePlayPause,
    ToggleTurntable,
    CycleLighting,
    ToggleTheme,
    ResetCamera,
    TakeScreenshot,
}

pub fn control_dock(
    ctx: &egui::Context,
    state: &ViewerState,
    catalog: &ModelCatalog,
) -> Vec<ControlIntent> {
    if !state.dock.visible() {
        return Vec::new();
    }

    let mut intents = Vec::new();
    let tokens = state.theme.tokens();
    let panel = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(
            tokens.panel_fill[0],
            tokens.panel_fill[1],
            tokens.panel_fill[2],
            tokens.panel_fill[3],
        ))
        .corner_radius(egui::CornerRadius::same(10))
        .inner_margin(egui::Margin::symmetric(12, 10));

    let compact = ctx.screen_rect().width() < COMPACT_BREAKPOINT;
    let area = if compact {
        egui::Area::new(egui::Id::new("control-dock"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -16.0))
    } else {
        egui::Area::new(egui::Id::new("control-dock"))
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(16.0, 16.0))
    };

    area.show(ctx, |ui| {
        panel.show(ui, |ui| {
            ui.visuals_mut().override_text_color = Some(egui::Color32::from_rgb(
                tokens.text[0],
                tokens.text[1],
                tokens.text[2],
            ));
            if compact {
                ui.horizontal_wrapped(|ui| {
                    dock_contents(ui, state, catalog, compact, &mut intents);
                });
            } else {
                ui.set_width(300.0);
                dock_contents(ui, state, catalog, compact, &mut intents);
            }
        });
    });
    intents
}

fn dock_contents(
    ui: &mut egui::Ui,
    state: &ViewerState,
    catalog: &ModelCatalog,
    compact: bool,
    intents: &mut Vec<ControlIntent>,
) {
    if !compact {
        ui.label("Character");
    }
    let mut chosen_model = state.selected_model.clone();
    egui::ComboBox::from_id_salt("model-select")
        .selected_text(chosen_model.clone())
        .show_ui(ui, |ui| {
            for id in catalog.ids() {
                ui.selectable_value(&mut chosen_model, (*id).to_string(), *id);
            }
        });
    if chosen_model != state.selected_model {
        intents.push(ControlIntent::SelectModel(chosen_model));
    }

    // The animation row only exists once a load has reported clips back.
    if !state.available_animations.is_empty() {
        if !compact {
            ui.add_space(6.0);
            ui.label("Animation");
        }
        let mut chosen_clip = state.selected_animation.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("animation-select")
            .selected_text(chosen_clip.clone())
            .show_ui(ui, |ui| {
                for name in &state.available_animations {
                    ui.selectable_value(&mut chosen_clip, name.clone(), name);
                }
            });
        if !chosen_clip.is_empty() && Some(chosen_clip.as_str()) != state.selected_animation.as_deref()
        {
            intents.push(ControlIntent::SelectAnimation(chosen_clip));
        }
        if state.selected_animation.is_some() {
            let label = if state.is_playing { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                intents.push(ControlIntent::TogglePlayPause);
            }
        }
    }

    if !compact {
        ui.add_space(6.0);
    }
    let mut turntable = state.turntable;
    if ui.checkbox(&mut turntable, "Turntable").changed() {
        intents.push(ControlIntent::ToggleTurntable);
    }

    let row = |ui: &mut egui::Ui, intents: &mut Vec<ControlIntent>| {
        if ui
            .button(format!("Lighting: {}", state.lighting.label()))
            .clicked()
        {
            intents.push(ControlIntent::CycleLighting);
        }
        if ui
            .button(format!("Theme: {}", state.theme.label()))
            .clicked()
        {
            intents.push(ControlIntent::ToggleTheme);
        }
        if ui.button("Reset View").clicked() {
            intents.push(ControlIntent::ResetCamera);
        }
        if ui.button("Screenshot").clicked() {
            intents.push(ControlIntent::TakeScreenshot);
        }
    };
    if compact {
        row(ui, intents);
    } else {
        ui.horizontal_wrapped(|ui| row(ui, intents));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{ModelCatalog, ViewerController};
    use std::time::{Duration, Instant};

    fn run_dock(controller: &ViewerController) -> Vec<ControlIntent> {
        let ctx = egui::Context::default();
        let mut intents = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            intents = control_dock(ctx, controller.state(), controller.catalog());
        });
        intents
    }

    #[test]
    fn dock_renders_without_emitting_intents() {
        let controller = ViewerController::new(ModelCatalog::new(), Instant::now());
        assert!(run_dock(&controller).is_empty());
    }

    #[test]
    fn hidden_dock_emits_nothing() {
        let now = Instant::now();
        let mut controller = ViewerController::new(ModelCatalog::new(), now);
        controller.tick_dock(now + Duration::from_secs(4));
        assert!(!controller.state().dock.visible());
        assert!(run_dock(&controller).is_empty());
    }

    #[test]
    fn animation_controls_wait_for_a_loaded_clip_list() {
        let now = Instant::now();
        let mut controller = ViewerController::new(ModelCatalog::new(), now);
        let generation = controller.generation();
        controller.animations_loaded(generation, vec!["Idle".into(), "Walk".into()]);

        // Rendering with clips present must still emit nothing without input.
        assert!(run_dock(&controller).is_empty());
    }
}
