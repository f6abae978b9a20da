use crate::assets::CharacterAsset;
use glam::Vec3;
use std::f32::consts::TAU;

/// Playback state for one named clip.
#[derive(Debug, Clone)]
struct ClipRun {
    name: String,
    time: f32,
    running: bool,
}

/// Engine-style per-clip transport: `play` starts a clip without touching
/// the others, so overlapping runs are possible by construction. Callers
/// that want exactly one active clip stop everything first.
#[derive(Debug, Default)]
pub struct ClipPlayer {
    runs: Vec<ClipRun>,
    last_started: Option<usize>,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the clip set; all playback state resets.
    pub fn set_clips(&mut self, names: &[String]) {
        self.runs = names
            .iter()
            .map(|name| ClipRun {
                name: name.clone(),
                time: 0.0,
                running: false,
            })
            .collect();
        self.last_started = None;
    }

    /// Starts `name` from the top. Returns false for an unknown clip.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(index) = self.runs.iter().position(|run| run.name == name) else {
            return false;
        };
        self.runs[index].time = 0.0;
        self.runs[index].running = true;
        self.last_started = Some(index);
        true
    }

    pub fn stop_all(&mut self) {
        for run in &mut self.runs {
            run.running = false;
            run.time = 0.0;
        }
        self.last_started = None;
    }

    pub fn advance(&mut self, dt: f32) {
        for run in &mut self.runs {
            if run.running {
                run.time += dt;
            }
        }
    }

    /// Most recently started clip that is still running.
    pub fn active(&self) -> Option<&str> {
        let index = self.last_started?;
        let run = &self.runs[index];
        run.running.then_some(run.name.as_str())
    }

    pub fn active_time(&self) -> f32 {
        self.last_started
            .and_then(|index| self.runs.get(index))
            .filter(|run| run.running)
            .map(|run| run.time)
            .unwrap_or(0.0)
    }

    pub fn running_count(&self) -> usize {
        self.runs.iter().filter(|run| run.running).count()
    }
}

/// Runtime scene: the installed character, its clip transport, and the
/// turntable yaw applied to the model root.
pub struct CharacterScene {
    asset: Option<CharacterAsset>,
    player: ClipPlayer,
    root_yaw: f32,
    posed: Vec<Vec3>,
}

impl CharacterScene {
    pub fn new() -> Self {
        Self {
            asset: None,
            player: ClipPlayer::new(),
            root_yaw: 0.0,
            posed: Vec::new(),
        }
    }

    /// Installs a freshly loaded character, discarding the previous one.
    /// Playback and turntable yaw start over.
    pub fn install(&mut self, asset: CharacterAsset) {
        self.player.set_clips(&asset.clip_names());
        self.root_yaw = 0.0;
        self.posed.clear();
        self.asset = Some(asset);
    }

    /// Empties the viewport, e.g. while the next model loads.
    pub fn clear(&mut self) {
        self.asset = None;
        self.player.set_clips(&[]);
        self.root_yaw = 0.0;
        self.posed.clear();
    }

    pub fn asset(&self) -> Option<&CharacterAsset> {
        self.asset.as_ref()
    }

    pub fn player(&self) -> &ClipPlayer {
        &self.player
    }

    /// Reconciles the transport against the desired active clip:
    /// stop-all-then-play-one on change, untouched otherwise so a running
    /// clip never restarts mid-play. Returns whether anything changed.
    pub fn apply_clip_directive(&mut self, active: Option<&str>) -> bool {
        if self.player.active() == active {
            return false;
        }
        self.player.stop_all();
        if let Some(name) = active {
            self.player.play(name);
        }
        true
    }

    pub fn advance(&mut self, dt: f32) {
        self.player.advance(dt);
    }

    /// Adds turntable rotation around the vertical axis.
    pub fn spin(&mut self, yaw_delta: f32) {
        if yaw_delta != 0.0 {
            self.root_yaw = (self.root_yaw + yaw_delta).rem_euclid(TAU);
        }
    }

    pub fn root_yaw(&self) -> f32 {
        self.root_yaw
    }

    fn refresh_pose(&mut self) {
        match &self.asset {
            Some(asset) => {
                let clip = self.player.active().and_then(|name| asset.find_clip(name));
                asset.posed_positions(clip, self.player.active_time(), &mut self.posed);
            }
            None => self.posed.clear(),
        }
    }

    /// Evaluates the current pose into model-space positions.
    pub fn pose_positions(&mut self) -> &[Vec3] {
        self.refresh_pose();
        &self.posed
    }

    /// Current pose and index buffer in one borrow, for handing to the
    /// renderer. None while no model is installed.
    pub fn mesh(&mut self) -> Option<(&[Vec3], &[u32])> {
        self.refresh_pose();
        let asset = self.asset.as_ref()?;
        Some((&self.posed, asset.indices.as_slice()))
    }

    pub fn indices(&self) -> &[u32] {
        self.asset
            .as_ref()
            .map(|asset| asset.indices.as_slice())
            .unwrap_or(&[])
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.asset.as_ref().map(|asset| asset.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AnimClip, NodeTree, TrackQuat};
    use glam::{Mat4, Quat};
    use std::collections::HashMap;
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn bending_asset() -> CharacterAsset {
        let mut rotations = HashMap::new();
        rotations.insert(
            0usize,
            TrackQuat {
                times: vec![0.0, 1.0],
                values: vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
            },
        );
        CharacterAsset {
            name: "rig".to_string(),
            nodes: NodeTree {
                parent: vec![None],
                rest_translation: vec![Vec3::ZERO],
                rest_rotation: vec![Quat::IDENTITY],
                rest_scale: vec![Vec3::ONE],
            },
            positions: vec![Vec3::new(0.0, 1.0, 0.0)],
            indices: vec![0],
            joints: vec![[0, 0, 0, 0]],
            weights: vec![[1.0, 0.0, 0.0, 0.0]],
            mesh_node: 0,
            joints_nodes: vec![0],
            inverse_bind: vec![Mat4::IDENTITY],
            clips: vec![AnimClip {
                name: "bend".to_string(),
                duration: 1.0,
                translations: HashMap::new(),
                rotations,
                scales: HashMap::new(),
            }],
        }
    }

    #[test]
    fn play_without_stop_can_overlap() {
        let mut player = ClipPlayer::new();
        player.set_clips(&names(&["walk", "idle"]));
        assert!(player.play("walk"));
        assert!(player.play("idle"));
        assert_eq!(player.running_count(), 2);
        assert_eq!(player.active(), Some("idle"));
    }

    #[test]
    fn directive_change_stops_everything_first() {
        let mut scene = CharacterScene::new();
        scene.player.set_clips(&names(&["walk", "idle"]));
        scene.player.play("walk");
        scene.player.play("idle");

        assert!(scene.apply_clip_directive(Some("walk")));
        assert_eq!(scene.player.running_count(), 1);
        assert_eq!(scene.player.active(), Some("walk"));
        assert_eq!(scene.player.active_time(), 0.0);
    }

    #[test]
    fn repeated_directive_never_restarts_the_clip() {
        let mut scene = CharacterScene::new();
        scene.player.set_clips(&names(&["walk"]));
        assert!(scene.apply_clip_directive(Some("walk")));
        scene.advance(0.5);
        assert!(!scene.apply_clip_directive(Some("walk")));
        assert!((scene.player.active_time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn none_directive_stops_playback() {
        let mut scene = CharacterScene::new();
        scene.player.set_clips(&names(&["walk"]));
        scene.apply_clip_directive(Some("walk"));
        scene.advance(0.25);

        assert!(scene.apply_clip_directive(None));
        assert_eq!(scene.player.running_count(), 0);
        assert_eq!(scene.player.active(), None);
    }

    #[test]
    fn unknown_directive_leaves_nothing_running() {
        let mut scene = CharacterScene::new();
        scene.player.set_clips(&names(&["walk"]));
        scene.apply_clip_directive(Some("walk"));
        scene.apply_clip_directive(Some("missing"));
        assert_eq!(scene.player.running_count(), 0);
    }

    #[test]
    fn advance_moves_only_running_clips() {
        let mut player = ClipPlayer::new();
        player.set_clips(&names(&["walk", "idle"]));
        player.play("walk");
        player.advance(0.4);
        assert!((player.active_time() - 0.4).abs() < 1e-6);
        player.stop_all();
        player.advance(0.4);
        assert_eq!(player.active_time(), 0.0);
    }

    #[test]
    fn install_resets_yaw_and_transport() {
        let mut scene = CharacterScene::new();
        scene.install(bending_asset());
        scene.apply_clip_directive(Some("bend"));
        scene.spin(1.0);
        scene.advance(0.5);

        scene.install(bending_asset());
        assert_eq!(scene.root_yaw(), 0.0);
        assert_eq!(scene.player.active(), None);
        assert_eq!(scene.player.active_time(), 0.0);
    }

    #[test]
    fn pose_follows_the_active_clip() {
        let mut scene = CharacterScene::new();
        scene.install(bending_asset());

        let rest = scene.pose_positions().to_vec();
        assert!((rest[0] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);

        scene.apply_clip_directive(Some("bend"));
        scene.advance(0.5);
        let posed = scene.pose_positions().to_vec();
        // Half a second into the one-second bend: 45 degrees about +Z.
        assert!((posed[0] - Vec3::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0)).length() < 1e-5);

        // Advancing to exactly the duration loops the clip back to rest.
        scene.advance(0.5);
        let looped = scene.pose_positions().to_vec();
        assert!((looped[0] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn spin_wraps_and_accumulates() {
        let mut scene = CharacterScene::new();
        scene.spin(1.0);
        scene.spin(1.0);
        assert!((scene.root_yaw() - 2.0).abs() < 1e-6);
        scene.spin(TAU);
        assert!((scene.root_yaw() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn cleared_scene_has_no_geometry() {
        let mut scene = CharacterScene::new();
        scene.install(bending_asset());
        scene.clear();
        assert!(scene.asset().is_none());
        assert!(scene.pose_positions().is_empty());
        assert!(scene.indices().is_empty());
    }
}
