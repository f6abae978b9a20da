mod animation;

pub use animation::{AnimClip, NodeTree, TrackQuat, TrackVec3};

use glam::{Mat4, Quat, Vec3};
use gltf::mesh::util::{ReadIndices, ReadJoints, ReadWeights};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import glTF at {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("no renderable mesh primitive in {path}")]
    NoGeometry { path: String },
}

/// CPU-side character asset: rest hierarchy, the renderable mesh, its skin
/// binding, and every animation clip found in the file (document order —
/// the first clip doubles as the default selection upstream).
#[derive(Debug, Clone)]
pub struct CharacterAsset {
    pub name: String,
    pub nodes: NodeTree,
    /// Authored positions, bind/model space.
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Empty when the mesh is rigid.
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    /// Node carrying the mesh, for the rigid transform path.
    pub mesh_node: usize,
    pub joints_nodes: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
    pub clips: Vec<AnimClip>,
}

impl CharacterAsset {
    pub fn clip_names(&self) -> Vec<String> {
        self.clips.iter().map(|clip| clip.name.clone()).collect()
    }

    pub fn find_clip(&self, name: &str) -> Option<&AnimClip> {
        self.clips.iter().find(|clip| clip.name == name)
    }

    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty()
    }

    /// Joint matrices (global × inverse-bind), in skin order, for `clip` at
    /// `time`; the rest pose when `clip` is `None`.
    pub fn palette(&self, clip: Option<&AnimClip>, time: f32) -> Vec<Mat4> {
        let globals = self.nodes.pose_globals(clip, time);
        self.joints_nodes
            .iter()
            .zip(&self.inverse_bind)
            .map(|(&node, ibm)| {
                let global = globals.get(node).copied().unwrap_or(Mat4::IDENTITY);
                global * *ibm
            })
            .collect()
    }

    /// Evaluates the pose and writes model-space vertex positions into
    /// `out` (cleared first).
    pub fn posed_positions(&self, clip: Option<&AnimClip>, time: f32, out: &mut Vec<Vec3>) {
        out.clear();
        out.reserve(self.positions.len());
        if self.is_skinned() {
            let palette = self.palette(clip, time);
            for ((position, joints), weights) in
                self.positions.iter().zip(&self.joints).zip(&self.weights)
            {
                let mut skinned = Vec3::ZERO;
                for (joint, weight) in joints.iter().zip(weights) {
                    if *weight == 0.0 {
                        continue;
                    }
                    let matrix = palette
                        .get(*joint as usize)
                        .copied()
                        .unwrap_or(Mat4::IDENTITY);
                    skinned += matrix.transform_point3(*position) * *weight;
                }
                out.push(skinned);
            }
        } else {
            let globals = self.nodes.pose_globals(clip, time);
            let transform = globals
                .get(self.mesh_node)
                .copied()
                .unwrap_or(Mat4::IDENTITY);
            for position in &self.positions {
                out.push(transform.transform_point3(*position));
            }
        }
    }

    /// Rest-pose bounds as (center, half extent).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut posed = Vec::new();
        self.posed_positions(None, 0.0, &mut posed);
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in &posed {
            min = min.min(*p);
            max = max.max(*p);
        }
        if posed.is_empty() {
            return (Vec3::ZERO, Vec3::ONE);
        }
        ((min + max) * 0.5, (max - min) * 0.5)
    }
}

/// Loads a character glb: node hierarchy, the mesh under the first skinned
/// node (falling back to the first mesh node), skin binding, and all clips.
pub fn load_character(name: &str, path: &Path) -> Result<CharacterAsset, AssetError> {
    let (doc, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.display().to_string(),
        source,
    })?;

    let nodes = read_node_tree(&doc);

    let mesh_host = doc
        .nodes()
        .find(|n| n.skin().is_some() && n.mesh().is_some())
        .or_else(|| doc.nodes().find(|n| n.mesh().is_some()))
        .ok_or_else(|| AssetError::NoGeometry {
            path: path.display().to_string(),
        })?;
    let mesh_node = mesh_host.index();
    let skinned = mesh_host.skin().is_some();

    let mut positions: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut joints: Vec<[u16; 4]> = Vec::new();
    let mut weights: Vec<[f32; 4]> = Vec::new();

    if let Some(mesh) = mesh_host.mesh() {
        for prim in mesh.primitives() {
            let reader = prim.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
            let Some(pos_it) = reader.read_positions() else {
                continue;
            };
            let base = positions.len() as u32;
            let prim_positions: Vec<Vec3> = pos_it.map(Vec3::from).collect();

            if skinned {
                let prim_joints: Vec<[u16; 4]> = match reader.read_joints(0) {
                    Some(ReadJoints::U16(it)) => it.collect(),
                    Some(ReadJoints::U8(it)) => it
                        .map(|v| [v[0] as u16, v[1] as u16, v[2] as u16, v[3] as u16])
                        .collect(),
                    // Bind stray vertices wholly to the first joint.
                    None => vec![[0; 4]; prim_positions.len()],
                };
                let prim_weights: Vec<[f32; 4]> = match reader.read_weights(0) {
                    Some(ReadWeights::F32(it)) => it.collect(),
                    Some(ReadWeights::U16(it)) => it
                        .map(|v| v.map(|w| w as f32 / 65535.0))
                        .collect(),
                    Some(ReadWeights::U8(it)) => {
                        it.map(|v| v.map(|w| w as f32 / 255.0)).collect()
                    }
                    None => vec![[1.0, 0.0, 0.0, 0.0]; prim_positions.len()],
                };
                joints.extend(prim_joints);
                weights.extend(prim_weights);
            }

            match reader.read_indices() {
                Some(ReadIndices::U8(it)) => indices.extend(it.map(|i| base + i as u32)),
                Some(ReadIndices::U16(it)) => indices.extend(it.map(|i| base + i as u32)),
                Some(ReadIndices::U32(it)) => indices.extend(it.map(|i| base + i)),
                None => indices.extend(base..base + prim_positions.len() as u32),
            }
            positions.extend(prim_positions);
        }
    }

    if positions.is_empty() {
        return Err(AssetError::NoGeometry {
            path: path.display().to_string(),
        });
    }

    let (joints_nodes, inverse_bind) = match mesh_host.skin() {
        Some(skin) => {
            let joints_nodes: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let reader = skin.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
            let inverse_bind: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
                Some(it) => it.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                None => vec![Mat4::IDENTITY; joints_nodes.len()],
            };
            (joints_nodes, inverse_bind)
        }
        None => (Vec::new(), Vec::new()),
    };

    let clips = read_clips(&doc, &buffers);

    Ok(CharacterAsset {
        name: name.to_string(),
        nodes,
        positions,
        indices,
        joints,
        weights,
        mesh_node,
        joints_nodes,
        inverse_bind,
        clips,
    })
}

fn read_node_tree(doc: &gltf::Document) -> NodeTree {
    let count = doc.nodes().len();
    let mut tree = NodeTree {
        parent: vec![None; count],
        rest_translation: vec![Vec3::ZERO; count],
        rest_rotation: vec![Quat::IDENTITY; count],
        rest_scale: vec![Vec3::ONE; count],
    };
    for node in doc.nodes() {
        for child in node.children() {
            tree.parent[child.index()] = Some(node.index());
        }
        let (t, r, s) = node.transform().decomposed();
        tree.rest_translation[node.index()] = Vec3::from(t);
        tree.rest_rotation[node.index()] = Quat::from_array(r).normalize();
        tree.rest_scale[node.index()] = Vec3::from(s);
    }
    tree
}

fn read_clips(doc: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<AnimClip> {
    let mut used_names = HashSet::new();
    let mut clips = Vec::new();
    for (index, anim) in doc.animations().enumerate() {
        let name = unique_clip_name(&mut used_names, anim.name(), index);
        let mut translations: HashMap<usize, TrackVec3> = HashMap::new();
        let mut rotations: HashMap<usize, TrackQuat> = HashMap::new();
        let mut scales: HashMap<usize, TrackVec3> = HashMap::new();
        let mut duration = 0.0f32;

        for channel in anim.channels() {
            let target = channel.target();
            let node = target.node().index();
            let reader = channel.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            if let Some(&last) = times.last() {
                duration = duration.max(last);
            }
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };
            use gltf::animation::util::ReadOutputs;
            match outputs {
                ReadOutputs::Translations(it) => {
                    translations.insert(
                        node,
                        TrackVec3 {
                            times,
                            values: it.map(Vec3::from).collect(),
                        },
                    );
                }
                ReadOutputs::Rotations(it) => {
                    rotations.insert(
                        node,
                        TrackQuat {
                            times,
                            values: it
                                .into_f32()
                                .map(|q| Quat::from_array(q).normalize())
                                .collect(),
                        },
                    );
                }
                ReadOutputs::Scales(it) => {
                    scales.insert(
                        node,
                        TrackVec3 {
                            times,
                            values: it.map(Vec3::from).collect(),
                        },
                    );
                }
                ReadOutputs::MorphTargetWeights(_) => {}
            }
        }

        clips.push(AnimClip {
            name,
            duration,
            translations,
            rotations,
            scales,
        });
    }
    clips
}

/// Clip names key the whole selection model, so collisions and missing
/// names get stable fallbacks.
fn unique_clip_name(used: &mut HashSet<String>, raw: Option<&str>, index: usize) -> String {
    let base = match raw {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("clip-{index}"),
    };
    let mut candidate = base.clone();
    let mut suffix = 1;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    fn single_joint_asset() -> CharacterAsset {
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
            clips: Vec::new(),
        }
    }

    #[test]
    fn missing_file_reports_an_import_error() {
        let err = load_character("ghost", Path::new("models/does-not-exist.glb")).unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn rest_pose_leaves_bind_positions_unchanged() {
        let asset = single_joint_asset();
        let mut posed = Vec::new();
        asset.posed_positions(None, 0.0, &mut posed);
        assert_eq!(posed.len(), 1);
        assert!((posed[0] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn skinning_follows_an_animated_joint() {
        let mut asset = single_joint_asset();
        let mut rotations = HashMap::new();
        rotations.insert(
            0usize,
            TrackQuat {
                times: vec![0.0, 1.0],
                values: vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
            },
        );
        asset.clips.push(AnimClip {
            name: "bend".to_string(),
            duration: 1.0,
            translations: HashMap::new(),
            rotations,
            scales: HashMap::new(),
        });

        let clip = asset.find_clip("bend").cloned().unwrap();
        let mut posed = Vec::new();
        // Halfway through the clip (0,1,0) has bent 45 degrees about +Z.
        asset.posed_positions(Some(&clip), 0.5, &mut posed);
        assert!((posed[0] - Vec3::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0)).length() < 1e-5);

        // Clips loop: exactly one duration in, the pose is back at rest.
        asset.posed_positions(Some(&clip), 1.0, &mut posed);
        assert!((posed[0] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn rigid_meshes_ride_their_node_transform() {
        let mut asset = single_joint_asset();
        asset.joints.clear();
        asset.weights.clear();
        asset.joints_nodes.clear();
        asset.inverse_bind.clear();
        asset.nodes.rest_translation[0] = Vec3::new(2.0, 0.0, 0.0);

        let mut posed = Vec::new();
        asset.posed_positions(None, 0.0, &mut posed);
        assert!((posed[0] - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn bounds_cover_the_rest_pose() {
        let mut asset = single_joint_asset();
        asset.positions = vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 2.0, 0.0)];
        asset.joints = vec![[0; 4]; 2];
        asset.weights = vec![[1.0, 0.0, 0.0, 0.0]; 2];
        let (center, half) = asset.bounds();
        assert!((center - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
        assert!((half - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn clip_name_fallbacks_stay_unique() {
        let mut used = HashSet::new();
        assert_eq!(unique_clip_name(&mut used, Some("walk"), 0), "walk");
        assert_eq!(unique_clip_name(&mut used, Some("walk"), 1), "walk-1");
        assert_eq!(unique_clip_name(&mut used, None, 2), "clip-2");
        assert_eq!(unique_clip_name(&mut used, Some(""), 3), "clip-3");
    }
}
