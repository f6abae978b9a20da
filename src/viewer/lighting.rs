use glam::Vec3;

/// Lighting presets in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingPreset {
    Studio,
    Sunrise,
}

/// Concrete light parameters a preset resolves to. `direction` points from
/// the light toward the scene and is normalized.
#[derive(Debug, Clone, Copy)]
pub struct LightRig {
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient: f32,
}

impl LightingPreset {
    pub const ALL: [LightingPreset; 2] = [LightingPreset::Studio, LightingPreset::Sunrise];

    pub fn next(self) -> Self {
        match self {
            LightingPreset::Studio => LightingPreset::Sunrise,
            LightingPreset::Sunrise => LightingPreset::Studio,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LightingPreset::Studio => "Studio",
            LightingPreset::Sunrise => "Sunrise",
        }
    }

    pub fn rig(&self) -> LightRig {
        match self {
            // Neutral key from high front-right with a generous fill.
            LightingPreset::Studio => LightRig {
                direction: Vec3::new(-10.0, -10.0, -5.0).normalize(),
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                ambient: 0.5,
            },
            // Warm key grazing in from the horizon.
            LightingPreset::Sunrise => LightRig {
                direction: Vec3::new(-6.0, -1.5, 4.0).normalize(),
                color: [1.0, 0.62, 0.42],
                intensity: 1.15,
                ambient: 0.28,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LightingPreset;

    #[test]
    fn cycling_through_every_preset_wraps() {
        for start in LightingPreset::ALL {
            let mut preset = start;
            for _ in 0..LightingPreset::ALL.len() {
                preset = preset.next();
            }
            assert_eq!(preset, start);
        }
    }

    #[test]
    fn rigs_are_normalized_and_distinct() {
        for preset in LightingPreset::ALL {
            let rig = preset.rig();
            assert!((rig.direction.length() - 1.0).abs() < 1e-5);
            assert!(rig.intensity > 0.0);
        }
        let studio = LightingPreset::Studio.rig();
        let sunrise = LightingPreset::Sunrise.rig();
        assert_ne!(studio.color, sunrise.color);
    }
}
