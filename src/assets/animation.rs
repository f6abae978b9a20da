use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Keyframe track of vectors. Times ascend and pair one-to-one with values.
#[derive(Debug, Clone)]
pub struct TrackVec3 {
    pub times: Vec<f32>,
    pub values: Vec<Vec3>,
}

/// Keyframe track of rotations.
#[derive(Debug, Clone)]
pub struct TrackQuat {
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
}

impl TrackVec3 {
    /// Linear interpolation, clamped to the first/last key.
    pub fn sample(&self, t: f32, default: Vec3) -> Vec3 {
        match segment(&self.times, t) {
            Segment::Empty => default,
            Segment::At(i) => self.values[i],
            Segment::Between(i, f) => self.values[i].lerp(self.values[i + 1], f),
        }
    }
}

impl TrackQuat {
    /// Spherical interpolation, clamped to the first/last key.
    pub fn sample(&self, t: f32, default: Quat) -> Quat {
        match segment(&self.times, t) {
            Segment::Empty => default,
            Segment::At(i) => self.values[i],
            Segment::Between(i, f) => self.values[i].slerp(self.values[i + 1], f),
        }
    }
}

enum Segment {
    Empty,
    At(usize),
    Between(usize, f32),
}

fn segment(times: &[f32], t: f32) -> Segment {
    let Some((&first, &last)) = times.first().zip(times.last()) else {
        return Segment::Empty;
    };
    if t <= first {
        return Segment::At(0);
    }
    if t >= last {
        return Segment::At(times.len() - 1);
    }
    let mut i = 0;
    while i + 1 < times.len() && times[i + 1] < t {
        i += 1;
    }
    let span = times[i + 1] - times[i];
    if span <= 0.0 {
        // Duplicate keys collapse to the later one.
        return Segment::At(i + 1);
    }
    Segment::Between(i, (t - times[i]) / span)
}

/// One named animation clip: per-node TRS tracks keyed by node index.
#[derive(Debug, Clone)]
pub struct AnimClip {
    pub name: String,
    pub duration: f32,
    pub translations: HashMap<usize, TrackVec3>,
    pub rotations: HashMap<usize, TrackQuat>,
    pub scales: HashMap<usize, TrackVec3>,
}

/// Rest-pose node hierarchy the clips animate. Parallel arrays indexed by
/// glTF node index; parents may appear after children.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    pub parent: Vec<Option<usize>>,
    pub rest_translation: Vec<Vec3>,
    pub rest_rotation: Vec<Quat>,
    pub rest_scale: Vec<Vec3>,
}

impl NodeTree {
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Global transform of every node at the rest pose.
    pub fn rest_globals(&self) -> Vec<Mat4> {
        self.pose_globals(None, 0.0)
    }

    /// Global transform of every node with `clip` applied at `time`
    /// (wrapped to the clip duration). `None` evaluates the rest pose.
    pub fn pose_globals(&self, clip: Option<&AnimClip>, time: f32) -> Vec<Mat4> {
        let mut translation = self.rest_translation.clone();
        let mut rotation = self.rest_rotation.clone();
        let mut scale = self.rest_scale.clone();

        if let Some(clip) = clip {
            let t = if clip.duration > 0.0 {
                time % clip.duration
            } else {
                0.0
            };
            for (&node, track) in &clip.translations {
                if node < translation.len() {
                    translation[node] = track.sample(t, self.rest_translation[node]);
                }
            }
            for (&node, track) in &clip.rotations {
                if node < rotation.len() {
                    rotation[node] = track.sample(t, self.rest_rotation[node]);
                }
            }
            for (&node, track) in &clip.scales {
                if node < scale.len() {
                    scale[node] = track.sample(t, self.rest_scale[node]);
                }
            }
        }

        let mut globals: Vec<Option<Mat4>> = vec![None; self.len()];
        for node in 0..self.len() {
            resolve_global(node, &self.parent, &translation, &rotation, &scale, &mut globals);
        }
        globals
            .into_iter()
            .map(|m| m.unwrap_or(Mat4::IDENTITY))
            .collect()
    }
}

fn resolve_global(
    node: usize,
    parent: &[Option<usize>],
    translation: &[Vec3],
    rotation: &[Quat],
    scale: &[Vec3],
    globals: &mut [Option<Mat4>],
) -> Mat4 {
    if let Some(m) = globals[node] {
        return m;
    }
    let local = Mat4::from_scale_rotation_translation(scale[node], rotation[node], translation[node]);
    let global = match parent[node] {
        Some(p) => resolve_global(p, parent, translation, rotation, scale, globals) * local,
        None => local,
    };
    globals[node] = Some(global);
    global
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn chain() -> NodeTree {
        // Root at x=1, child one unit above it.
        NodeTree {
            parent: vec![None, Some(0)],
            rest_translation: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            rest_rotation: vec![Quat::IDENTITY; 2],
            rest_scale: vec![Vec3::ONE; 2],
        }
    }

    #[test]
    fn vector_track_interpolates_and_clamps() {
        let track = TrackVec3 {
            times: vec![0.0, 1.0],
            values: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)],
        };
        assert_eq!(track.sample(-1.0, Vec3::ONE), Vec3::ZERO);
        assert_eq!(track.sample(0.5, Vec3::ONE), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(track.sample(5.0, Vec3::ONE), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn empty_track_yields_the_default() {
        let track = TrackVec3 {
            times: Vec::new(),
            values: Vec::new(),
        };
        assert_eq!(track.sample(0.3, Vec3::splat(7.0)), Vec3::splat(7.0));
    }

    #[test]
    fn rotation_track_slerps_halfway() {
        let track = TrackQuat {
            times: vec![0.0, 1.0],
            values: vec![Quat::IDENTITY, Quat::from_rotation_y(FRAC_PI_2)],
        };
        let halfway = track.sample(0.5, Quat::IDENTITY);
        let (_, angle) = halfway.to_axis_angle();
        assert!((angle - FRAC_PI_2 / 2.0).abs() < 1e-5);
    }

    #[test]
    fn globals_compose_down_the_chain() {
        let tree = chain();
        let globals = tree.rest_globals();
        let child = globals[1].transform_point3(Vec3::ZERO);
        assert!((child - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn clip_time_wraps_at_the_duration() {
        let tree = chain();
        let mut translations = HashMap::new();
        translations.insert(
            0usize,
            TrackVec3 {
                times: vec![0.0, 1.0],
                values: vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
            },
        );
        let clip = AnimClip {
            name: "slide".to_string(),
            duration: 1.0,
            translations,
            rotations: HashMap::new(),
            scales: HashMap::new(),
        };

        let at_quarter = tree.pose_globals(Some(&clip), 0.25);
        let wrapped = tree.pose_globals(Some(&clip), 1.25);
        let a = at_quarter[0].transform_point3(Vec3::ZERO);
        let b = wrapped[0].transform_point3(Vec3::ZERO);
        assert!((a - b).length() < 1e-6);
        assert!((a.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn untracked_nodes_keep_their_rest_pose() {
        let tree = chain();
        let mut translations = HashMap::new();
        translations.insert(
            0usize,
            TrackVec3 {
                times: vec![0.0, 1.0],
                values: vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)],
            },
        );
        let clip = AnimClip {
            name: "drift".to_string(),
            duration: 1.0,
            translations,
            rotations: HashMap::new(),
            scales: HashMap::new(),
        };
        let globals = tree.pose_globals(Some(&clip), 1.0);
        // Child keeps its local offset relative to the animated root.
        let child = globals[1].transform_point3(Vec3::ZERO);
        let root = globals[0].transform_point3(Vec3::ZERO);
        assert!(((child - root) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }
}
